//! Column names of the `nyc_sales` source table and the presentation row set.
//!
//! Downstream reporting tooling depends on these exact names; keep them in
//! one place so the output contract cannot drift per call site.

/// Source columns (input table).
pub const NEIGHBORHOOD: &str = "NEIGHBORHOOD";
pub const BUILDING_CLASS_CATEGORY: &str = "BUILDING_CLASS_CATEGORY";
pub const BOROUGH: &str = "BOROUGH";
pub const BLOCK: &str = "BLOCK";
pub const LOT: &str = "LOT";
pub const ZIP_CODE: &str = "ZIP_CODE";
pub const TOTAL_UNITS: &str = "TOTAL_UNITS";
pub const GROSS_SQUARE_FEET: &str = "GROSS_SQUARE_FEET";
pub const LAND_SQUARE_FEET: &str = "LAND_SQUARE_FEET";
pub const YEAR_BUILT: &str = "YEAR_BUILT";
pub const SALE_PRICE: &str = "SALE_PRICE";
pub const SALE_DATE: &str = "SALE_DATE";
pub const ADDRESS: &str = "ADDRESS";

/// Derived columns (output row set).
pub const FORMATTED_SALE_PRICE: &str = "formatted_sale_price";
pub const RAW_SALE_PRICE: &str = "raw_sale_price";
pub const SALE_PRICE_ZSCORE: &str = "sale_price_zscore";
pub const SALE_PRICE_ZSCORE_NEIGHBORHOOD: &str = "sale_price_zscore_neighborhood";
pub const SQUARE_FT_PER_UNIT: &str = "square_ft_per_unit";
pub const PRICE_PER_UNIT: &str = "price_per_unit";

/// Every column the cleaner expects to find in the source frame.
pub const SOURCE_COLUMNS: [&str; 13] = [
    NEIGHBORHOOD,
    BUILDING_CLASS_CATEGORY,
    BOROUGH,
    BLOCK,
    LOT,
    ZIP_CODE,
    TOTAL_UNITS,
    GROSS_SQUARE_FEET,
    LAND_SQUARE_FEET,
    YEAR_BUILT,
    SALE_PRICE,
    SALE_DATE,
    ADDRESS,
];

/// Fields that must carry a positive value for a row to survive cleaning.
pub const REQUIRED_COLUMNS: [&str; 3] = [SALE_PRICE, TOTAL_UNITS, GROSS_SQUARE_FEET];

/// Numeric fields cast to Float64 (failed casts become null).
pub const FLOAT_COLUMNS: [&str; 3] = [SALE_PRICE, GROSS_SQUARE_FEET, LAND_SQUARE_FEET];

/// Numeric fields cast to Int64 (failed casts become null).
pub const INT_COLUMNS: [&str; 6] = [BOROUGH, BLOCK, LOT, ZIP_CODE, TOTAL_UNITS, YEAR_BUILT];

/// Presentation column order of the output row set.
pub const OUTPUT_COLUMNS: [&str; 13] = [
    NEIGHBORHOOD,
    ADDRESS,
    BOROUGH,
    BLOCK,
    LOT,
    ZIP_CODE,
    BUILDING_CLASS_CATEGORY,
    FORMATTED_SALE_PRICE,
    RAW_SALE_PRICE,
    SALE_PRICE_ZSCORE,
    SALE_PRICE_ZSCORE_NEIGHBORHOOD,
    SQUARE_FT_PER_UNIT,
    PRICE_PER_UNIT,
];
