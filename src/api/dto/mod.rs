/*
 * Responsibility
 * - HTTP 入出力の形 (query string など) と store / schema の型との変換
 */
pub mod list_query;

pub use list_query::parse_list_query;
