pub mod candle;
pub mod direction;
pub mod market_state;
pub mod prediction;
pub mod setup;
pub mod signal;
pub mod timeframe;

pub use candle::{calc_atr, Candle, CandleSeries};
pub use direction::{Bias, CredibilityLabel, Direction, EdgeLabel, Regime};
pub use market_state::{
    AlphaLeak, AlphaState, CorrelationRisk, CorrelationState, CyclePhase, CycleState,
    EngineStatus, FractalState, IcebergWall, LiquidityMagnet, MacroAction, MacroState,
    MarketStateSnapshot, MomentumState, MtfState, NewsShock, OrderBookState, OrderFlowState,
    SentimentState, SessionState, ShockSeverity, SmtState, StochasticState, SweepState,
    TrapZone, TrapZones, TrendState, VolumeProfileState, VolumeState,
};
pub use prediction::{Prediction, PredictionOutcome};
pub use setup::{EntryZone, ScoreBreakdown, Setup};
pub use signal::{Signal, SignalStatus};
pub use timeframe::{Timeframe, TraderProfile};
