//! Order document layout shared by the ingest pipeline and the analytics API
//!
//! Documents are stored in PostgreSQL as one JSONB object per CSV row, keyed
//! by the CSV header names. The analytics queries address fields through the
//! same names, so both sides must agree on them.

// ============================================================================
// Storage
// ============================================================================

/// Table holding one JSONB document per ingested order row.
pub const ORDERS_TABLE: &str = "orders";

// ============================================================================
// Field Names
// ============================================================================

pub const ORDER_ID: &str = "Order ID";
pub const ORDER_DATE: &str = "Order Date";
pub const SHIP_DATE: &str = "Ship Date";
pub const PRODUCT_ID: &str = "Product ID";
pub const CATEGORY: &str = "Category";
pub const SUB_CATEGORY: &str = "Sub-Category";
pub const SALES: &str = "Sales";

/// Fields every row must carry with a non-empty value.
pub const REQUIRED_FIELDS: [&str; 6] = [ORDER_ID, ORDER_DATE, PRODUCT_ID, CATEGORY, SUB_CATEGORY, SALES];

/// Fields converted from `MM/DD/YYYY` strings to dates.
pub const DATE_FIELDS: [&str; 2] = [ORDER_DATE, SHIP_DATE];

/// Field converted from a numeric string to a float.
pub const NUMERIC_FIELD: &str = SALES;

/// Fields that get a lookup index before the first batch is written.
pub const INDEXED_FIELDS: [&str; 4] = [ORDER_ID, PRODUCT_ID, CATEGORY, ORDER_DATE];

/// `chrono` format of the date fields in the source file.
pub const SOURCE_DATE_FORMAT: &str = "%m/%d/%Y";

/// `chrono` format of the date fields inside stored documents.
///
/// ISO dates sort lexically and cast directly with `::date` in SQL.
pub const STORED_DATE_FORMAT: &str = "%Y-%m-%d";

/// Placeholder used in diagnostics when a row has no usable order identifier.
pub const UNKNOWN_ORDER_ID: &str = "unknown";
