//! Editor selectors per site. Markup on these sites changes without
//! notice, so every field carries several fallbacks, most specific first.

pub mod infoq;
pub mod zenn;
