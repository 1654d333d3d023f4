//! Command registration, dispatch, and suggestions for the Portico proxy.
//!
//! Lines typed by players or the console are either handled by a registered
//! command or forwarded unchanged to the backend server. This crate provides:
//!
//! - [`CommandManager`] -- alias table, dispatch, and suggestion entry points
//! - [`Command`] -- simple, raw, and grammar command kinds
//! - [`InvocableCommand`] -- the trait behind simple and raw commands
//! - [`GrammarNode`] -- literal, argument, and redirect nodes of a command grammar
//! - [`CommandMeta`] -- aliases and completion hints for a registration
//! - [`DispatchHandle`] / [`SuggestionHandle`] -- in-flight requests
//! - [`CommandSource`] -- whoever typed the line

pub mod command;
pub mod dispatch;
pub mod error;
pub mod manager;
pub mod node;
pub mod parse;
pub mod source;
pub mod suggest;

mod table;
mod tree;

pub use command::{
    Command, CommandMeta, CommandMetaBuilder, GrammarInvocation, InvocableCommand, Invocation,
    RawInvocation, SimpleInvocation,
};
pub use dispatch::{DispatchHandle, DispatchOutcome};
pub use error::{CommandError, CompletionError, RegistrationError, SuggestionError};
pub use manager::CommandManager;
pub use node::{
    ArgumentKind, ArgumentValue, CommandContext, GrammarExecutor, GrammarNode, NodeKind,
    Requirement, SuggestionContext, SuggestionProvider,
};
pub use parse::{parse, ParseResults, ParsedNode, SyntaxError};
pub use source::CommandSource;
pub use suggest::SuggestionHandle;
