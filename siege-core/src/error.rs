//! Rule violations
//!
//! A violation never changes the board. Its `Display` text is what the engine
//! stores in `GameState::warning` for the caller to surface.

use crate::board::Coord;
use crate::game::{Phase, Side, TokenId};
use crate::routes::Route;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    #[error("the game is over")]
    GameOver,
    #[error("not allowed during the {0} phase")]
    WrongPhase(Phase),
    #[error("it is not {0}'s turn")]
    NotYourTurn(Side),
    #[error("{0} is not a board square")]
    OffBoard(Coord),
    #[error("{0} is already occupied")]
    SquareOccupied(Coord),
    #[error("no reserve tokens left to place")]
    ReserveEmpty,
    #[error("route {0} is not in hand")]
    RouteNotInHand(Route),
    #[error("route {0} was already used this turn")]
    RouteAlreadyUsed(Route),
    #[error("no token {0}")]
    UnknownToken(TokenId),
    #[error("token {0} belongs to the other side")]
    NotYourToken(TokenId),
    #[error("token {0} is not on the board")]
    TokenNotOnBoard(TokenId),
    #[error("token {0} is siege-locked")]
    TokenLocked(TokenId),
    #[error("route {0} has no squares to visit")]
    EmptyTrace(Route),
    #[error("route {0} never leaves {1}")]
    TraceStaysHome(Route, Coord),
    #[error("{0} is held by a friendly token")]
    FriendlyDestination(Coord),
    #[error("a remaining route can still be used")]
    RoutesStillUsable,
    #[error("every route in hand has been used")]
    NoUnusedRoutes,
    #[error("an extra reinforcement was already bought this turn")]
    ExtraAlreadyBought,
    #[error("needs {needed} reserve, have {available}")]
    InsufficientReserve { needed: u32, available: u32 },
    #[error("needs {needed} captives, have {available}")]
    InsufficientCaptives { needed: u32, available: u32 },
    #[error("an early swap was already made this turn")]
    EarlySwapUsed,
    #[error("an early swap is already armed")]
    EarlySwapArmed,
    #[error("no early swap is armed")]
    EarlySwapNotArmed,
    #[error("choose a hand route and a queue slot first")]
    SwapIncomplete,
    #[error("queue slot {0} does not exist")]
    InvalidQueueSlot(usize),
    #[error("evasion was already used this game")]
    EvasionUsed,
    #[error("{0} cannot evade on its own turn")]
    EvasionOnOwnTurn(Side),
    #[error("no evasion has been selected")]
    NoEvasionSelected,
    #[error("token {0} cannot be rescued by evasion")]
    InvalidEvasionTarget(TokenId),
}
