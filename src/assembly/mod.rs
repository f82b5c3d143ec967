/*!
 * Assembly Module
 * Parent contexts, global context and the wire shapes of assembled events
 */

mod assembler;
mod contexts;
pub mod format;
mod global_context;

pub use assembler::{start_rum_assembly, AssembledEvent, AssemblyInputs, RumContext, SessionType};
pub use contexts::{ActionContext, ActionRef, ParentContexts, ViewContext, ViewRef};
pub use format::{to_wire, WireFormat};
pub use global_context::GlobalContext;
