/*
 * Responsibility
 * - 認証 (access) と認可 (ownership) の middleware
 * - 順序: access が AuthCtx を入れる → ownership guard が subject を使う
 */
pub mod access;
pub mod ownership;
