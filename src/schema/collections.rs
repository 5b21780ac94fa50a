/**
 * Responsibility
 *
 * 主な責務
 *  - collection ごとの「意味付き型」と schema を宣言する
 *  - handler / guard はこの型パラメータで collection を選ぶ
 *
 * 置くもの
 *  - Todos, Categories といったタグ型
 *  - 各 collection の field 定義
 *
 * 置かないもの
 *  - 検証ロジック (super::Schema)
 *  - store / HTTP への依存
 */
use super::{CREATED_AT_FIELD, Field, OWNER_FIELD, Schema};

/// A document collection served under `/{NAME}` and `/{NAME}/{id}`.
pub trait Collection: Send + Sync + 'static {
    const NAME: &'static str;
    const SCHEMA: &'static Schema;
}

// todos
pub enum Todos {}

pub const TODOS: Schema = Schema {
    fields: &[
        Field::string(OWNER_FIELD).required(),
        Field::string("content").required(),
        Field::bool("isDone").required(),
        Field::datetime(CREATED_AT_FIELD).defaults_to_now(),
        Field::string("categoryID").nullable(),
    ],
};

impl Collection for Todos {
    const NAME: &'static str = "todos";
    const SCHEMA: &'static Schema = &TODOS;
}

// categories
pub enum Categories {}

pub const CATEGORIES: Schema = Schema {
    fields: &[
        Field::string(OWNER_FIELD).required(),
        Field::string("name").required(),
        Field::datetime(CREATED_AT_FIELD).defaults_to_now(),
    ],
};

impl Collection for Categories {
    const NAME: &'static str = "categories";
    const SCHEMA: &'static Schema = &CATEGORIES;
}
