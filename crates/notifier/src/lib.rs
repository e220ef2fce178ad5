//! Push notifications for new comments on solutions.

pub mod dispatcher;
pub mod oauth;
pub mod payload;
pub mod push;
