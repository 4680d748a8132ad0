pub mod ids;
pub mod kind;
pub mod node;
pub mod node_flags;
pub mod symbol;
pub mod symbol_flags;
pub mod type_node;

pub use kind::SyntaxKind;
pub use node::*;
pub use node_flags::{ModifierFlags, NodeFlags, Variance};
pub use symbol::{Symbol, SymbolTable};
pub use symbol_flags::SymbolFlags;
pub use type_node::TypeNode;
