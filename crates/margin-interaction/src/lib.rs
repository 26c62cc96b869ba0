//! Assistant backends for Margin.
//!
//! - `remote_agent`: HTTP call to a hosted conversational agent
//! - `simulated_agent`: keyword-driven canned replies with an artificial delay
//! - `prompt`: notes context sent along with a question

pub mod error;
pub mod prompt;
pub mod remote_agent;
pub mod simulated_agent;

pub use error::RemoteCallError;
pub use remote_agent::{AgentRequest, HttpRemoteAgent, RemoteAgent, UNRECOGNIZED_REPLY};
pub use simulated_agent::{FixedPicker, RandomPicker, ReplyPicker, SimulatedAgent};
