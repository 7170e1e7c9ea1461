//! Source analysis shared by the validator, the repairer and the sandbox.
//!
//! Nothing here is a full TypeScript front end: [`jsx`] scans markup with
//! byte spans and [`imports`] reads import statements and declared names.
//! Both tolerate malformed input.

pub mod imports;
pub mod jsx;
