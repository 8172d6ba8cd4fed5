use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ledger entry kinds. Additions and resets carry non-negative amounts,
/// deductions carry negative amounts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum EntryKind {
    #[sea_orm(string_value = "ADDITION")]
    #[serde(rename = "ADDITION")]
    Addition,

    #[sea_orm(string_value = "DEDUCTION")]
    #[serde(rename = "DEDUCTION")]
    Deduction,

    #[sea_orm(string_value = "RESET")]
    #[serde(rename = "RESET")]
    Reset,
}

/// Append-only ledger record. The amount is the raw signed delta, even when
/// the balance update clamped at zero.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "time_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub child_id: i32,

    /// Signed minutes: negative for deductions, positive otherwise
    pub amount: i32,

    pub reason: String,

    pub kind: EntryKind,

    /// The acting parent (resets in the sweep are attributed to the
    /// child's own parent)
    pub created_by: i32,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::children::Entity",
        from = "Column::ChildId",
        to = "super::children::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Child,

    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::CreatedBy",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    CreatedBy,
}

impl Related<super::children::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Child.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CreatedBy.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
