pub mod field_selection;
pub mod filter_expr;
pub mod selection_tree;

pub use field_selection::{FieldSelection, ReadRequest};
pub use filter_expr::{FieldFilter, FilterExpr};
pub use selection_tree::{
    FieldPath, OrderByItem, RelationArgs, RelationSelection, RootArgs, SelectionNode,
    SelectionTree,
};
