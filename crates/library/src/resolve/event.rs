use derive_more::Display;
use vela_cache::UnitKey;

/// Strategies tried, in order, to find a unit's resources.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// `resources` export of the `-resources` module.
    #[display("primary")]
    Primary,
    /// `book{b}Unit{u}Resources` export of the `-resources` module.
    #[display("legacy")]
    Legacy,
    /// `getBook{b}Unit{u}Resources` getter of the `-implementation` module.
    #[display("implementation")]
    Implementation,
}

/// Published by the [`Resolver`](crate::Resolver) on its broadcast channel.
///
/// Events are informational. Nobody has to listen and a slow subscriber only
/// loses events, it never slows resolution down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveEvent {
    CacheHit { key: UnitKey },
    Resolved { key: UnitKey, strategy: Strategy, count: usize },
    /// A loader failed; resolution carried on with the next strategy.
    StrategyFailed { key: UnitKey, strategy: Strategy, message: String },
    /// No strategy produced anything. Not cached.
    Miss { key: UnitKey },
    PreloadCancelled { key: UnitKey },
}

impl ResolveEvent {
    pub fn key(&self) -> &UnitKey {
        match self {
            Self::CacheHit { key }
            | Self::Resolved { key, .. }
            | Self::StrategyFailed { key, .. }
            | Self::Miss { key }
            | Self::PreloadCancelled { key } => key,
        }
    }
}
