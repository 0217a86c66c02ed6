//! Interactive CLI chat for nhoru.
//!
//! Implements the chat loop: intro banner, rate-limited submissions with a
//! waiting spinner, slash commands for the session lifecycle, and a
//! background printer for limiter and connectivity notices. Entry point:
//! `loop_runner::run_chat_loop`.

pub mod banner;
pub mod commands;
pub mod input;
pub mod loop_runner;
pub mod notices;
