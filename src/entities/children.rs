use sea_orm::entity::prelude::*;

/// A child's allowance profile. `current_time` is the remaining balance in
/// minutes; it never goes below zero but may exceed `daily_allowance`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "children")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    #[sea_orm(unique)]
    pub username: String,

    /// Baseline minutes restored by every reset
    pub daily_allowance: i32,

    /// Remaining minutes, floored at zero
    pub current_time: i32,

    pub last_reset: String,

    /// Owning parent (role PARENT)
    pub parent_id: i32,

    /// Optional login account (role CHILD)
    pub user_id: Option<i32>,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ParentId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Parent,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Parent.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
