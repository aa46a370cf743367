//! Game state: tokens, sides, cards and turn bookkeeping

use crate::board::{Coord, NotationError};
use crate::deck::Deck;
use crate::error::RuleViolation;
use crate::routes::{route_catalog, Route};
use crate::ruleset::RuleSet;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Snapshot schema version
pub const STATE_VERSION: u32 = 1;

/// Face-up queue size
pub const QUEUE_SIZE: usize = 3;

// ============================================================================
// CORE TYPES
// ============================================================================

/// Player side
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    White = 0,
    Black = 1,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::White, Side::Black];

    pub fn opponent(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Token id prefix
    pub fn prefix(self) -> char {
        match self {
            Side::White => 'W',
            Side::Black => 'B',
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::White => f.write_str("White"),
            Side::Black => f.write_str("Black"),
        }
    }
}

/// Turn phase
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Opening,
    Action,
    Reinforce,
    Swap,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Opening => "opening",
            Phase::Action => "action",
            Phase::Reinforce => "reinforce",
            Phase::Swap => "swap",
        };
        f.write_str(name)
    }
}

/// Stable token identifier, rendered as side prefix plus serial (`W3`)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TokenId {
    pub owner: Side,
    pub serial: u32,
}

impl TokenId {
    pub const fn new(owner: Side, serial: u32) -> Self {
        Self { owner, serial }
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.owner.prefix(), self.serial)
    }
}

impl FromStr for TokenId {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || NotationError::InvalidToken(s.to_string());
        let mut chars = s.trim().chars();
        let owner = match chars.next().map(|c| c.to_ascii_uppercase()) {
            Some('W') => Side::White,
            Some('B') => Side::Black,
            _ => return Err(err()),
        };
        let serial = chars.as_str().parse().map_err(|_| err())?;
        Ok(Self::new(owner, serial))
    }
}

impl TryFrom<String> for TokenId {
    type Error = NotationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TokenId> for String {
    fn from(id: TokenId) -> Self {
        id.to_string()
    }
}

/// Where a token is
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    Board(Coord),
    /// Held by the capturing side
    Captive { by: Side },
    /// Removed from play, still owned
    Void,
}

/// A token. Tokens are never destroyed, only relocated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    pub location: Location,
}

impl Token {
    pub fn owner(&self) -> Side {
        self.id.owner
    }

    pub fn square(&self) -> Option<Coord> {
        match self.location {
            Location::Board(c) => Some(c),
            _ => None,
        }
    }
}

/// Cumulative per-side statistics; observational only
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SideStats {
    pub captures: u32,
    pub sieges: u32,
    pub invades: u32,
    pub drafts: u32,
    pub evasions: u32,
}

/// Everything owned by one side
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SideState {
    /// Unborn tokens available for placement
    pub reserve: u32,
    /// Enemy tokens this side holds
    pub captive: u32,
    /// This side's own tokens removed from play
    pub void: u32,
    /// Invasion captures made this turn
    pub turn_invades: u32,
    pub opening_placed: u32,
    /// Last serial handed out
    pub serial: u32,
    pub hand: Vec<Route>,
    pub evasion_used: bool,
    pub stats: SideStats,
}

/// Hand/queue swap being assembled
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PendingSwap {
    /// Armed during the action phase (paid with captives)
    pub early: bool,
    pub route: Option<Route>,
    pub slot: Option<usize>,
}

/// Evasion target chosen by the waiting side
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEvasion {
    pub side: Side,
    pub token: TokenId,
}

/// The capture made by the most recent route use, if that was the last action
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvasionRecord {
    pub victim: TokenId,
    pub at: Coord,
    pub by: Side,
}

/// Most recent board change, for ghosting in a UI
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LastMove {
    Route {
        token: TokenId,
        route: Route,
        from: Coord,
        trace: Vec<Coord>,
    },
    Placement {
        token: TokenId,
        at: Coord,
    },
    Evasion {
        token: TokenId,
        from: Coord,
        to: Coord,
    },
}

/// Why the game ended
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WinReason {
    Elimination,
    Siegemate,
}

impl fmt::Display for WinReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WinReason::Elimination => f.write_str("elimination"),
            WinReason::Siegemate => f.write_str("siegemate"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOver {
    pub winner: Side,
    pub reason: WinReason,
}

// ============================================================================
// GAME STATE
// ============================================================================

/// The whole game. Serializes to a plain record with no hidden state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub(crate) version: u32,
    pub(crate) rules: RuleSet,
    pub(crate) phase: Phase,
    pub(crate) active: Side,
    /// Current turn, starting at 1
    pub(crate) turn: u32,
    /// Increments after the second mover's turn
    pub(crate) round: u32,
    pub(crate) sides: [SideState; 2],
    pub(crate) tokens: Vec<Token>,
    pub(crate) deck: Deck,
    pub(crate) queue: Vec<Route>,
    pub(crate) used_routes: Vec<Route>,
    pub(crate) pending_swap: PendingSwap,
    pub(crate) pending_evasion: Option<PendingEvasion>,
    pub(crate) early_swap_used: bool,
    pub(crate) extra_reinforcement_bought: bool,
    pub(crate) reinforcements_to_place: u32,
    pub(crate) last_invasion: Option<InvasionRecord>,
    pub(crate) log: Vec<String>,
    pub(crate) last_move: Option<LastMove>,
    pub(crate) warning: Option<String>,
    pub(crate) game_over: Option<GameOver>,
}

/// Mid-game setup used by tests, puzzles and analysis tools
#[derive(Clone, Debug, Default)]
pub struct Position {
    pub white: Vec<Coord>,
    pub black: Vec<Coord>,
    /// Empty hands are dealt from the deck
    pub white_hand: Vec<Route>,
    pub black_hand: Vec<Route>,
    /// Empty queue is dealt from the deck
    pub queue: Vec<Route>,
    /// `None` puts every token not on the board or captive into reserve;
    /// otherwise the remainder goes to Void
    pub reserve: [Option<u32>; 2],
    /// Enemy tokens held by each side
    pub captives: [u32; 2],
    pub active: Option<Side>,
}

impl GameState {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Fresh game in the opening phase with a shuffled deck
    pub fn new<R: Rng>(rules: RuleSet, rng: &mut R) -> Self {
        let deck = Deck::shuffled(rules.route_copies, rng);
        let reserve = rules.tokens_per_side();
        let side = SideState {
            reserve,
            ..SideState::default()
        };

        Self {
            version: STATE_VERSION,
            phase: Phase::Opening,
            active: rules.first_player,
            turn: 1,
            round: 1,
            sides: [side.clone(), side],
            tokens: Vec::new(),
            deck,
            queue: Vec::new(),
            used_routes: Vec::new(),
            pending_swap: PendingSwap::default(),
            pending_evasion: None,
            early_swap_used: false,
            extra_reinforcement_bought: false,
            reinforcements_to_place: 0,
            last_invasion: None,
            log: vec![format!("Game begins: {} places first", rules.first_player)],
            last_move: None,
            warning: None,
            game_over: None,
            rules,
        }
    }

    /// Start directly in the action phase from a given layout.
    ///
    /// The deck holds every card not dealt to the hands or queue, in catalog
    /// order.
    pub fn with_position(rules: RuleSet, position: &Position) -> anyhow::Result<Self> {
        rules.validate()?;

        let mut cards: Vec<Route> = route_catalog()
            .into_iter()
            .flat_map(|route| std::iter::repeat(route).take(rules.route_copies))
            .collect();
        let mut take = |route: Route| -> anyhow::Result<Route> {
            let idx = cards
                .iter()
                .position(|&c| c == route)
                .ok_or_else(|| anyhow::anyhow!("no copy of {} left in the deck", route))?;
            Ok(cards.remove(idx))
        };
        let white_hand = position
            .white_hand
            .iter()
            .map(|&r| take(r))
            .collect::<anyhow::Result<Vec<_>>>()?;
        let black_hand = position
            .black_hand
            .iter()
            .map(|&r| take(r))
            .collect::<anyhow::Result<Vec<_>>>()?;
        let queue = position
            .queue
            .iter()
            .map(|&r| take(r))
            .collect::<anyhow::Result<Vec<_>>>()?;
        if !queue.is_empty() && queue.len() != QUEUE_SIZE {
            anyhow::bail!("queue must hold exactly {} routes", QUEUE_SIZE);
        }

        let mut deck = Deck::from_cards(cards);
        let mut deal = |given: Vec<Route>, n: usize| {
            if given.is_empty() {
                (0..n).map(|_| deck.draw()).collect()
            } else {
                given
            }
        };
        let white_hand = deal(white_hand, rules.starting_hand);
        let black_hand = deal(black_hand, rules.starting_hand);
        let queue = deal(queue, QUEUE_SIZE);

        let mut state = Self {
            version: STATE_VERSION,
            phase: Phase::Action,
            active: position.active.unwrap_or(rules.first_player),
            turn: 1,
            round: 1,
            sides: [SideState::default(), SideState::default()],
            tokens: Vec::new(),
            deck,
            queue,
            used_routes: Vec::new(),
            pending_swap: PendingSwap::default(),
            pending_evasion: None,
            early_swap_used: false,
            extra_reinforcement_bought: false,
            reinforcements_to_place: 0,
            last_invasion: None,
            log: Vec::new(),
            last_move: None,
            warning: None,
            game_over: None,
            rules,
        };
        state.sides[Side::White.index()].hand = white_hand;
        state.sides[Side::Black.index()].hand = black_hand;

        for side in Side::BOTH {
            let squares = match side {
                Side::White => &position.white,
                Side::Black => &position.black,
            };
            for &at in squares {
                if !at.is_valid() {
                    anyhow::bail!("{} is off the board", at);
                }
                if state.occupant(at).is_some() {
                    anyhow::bail!("{} is listed twice", at);
                }
                let id = state.next_token_id(side);
                state.tokens.push(Token {
                    id,
                    location: Location::Board(at),
                });
            }
            state.sides[side.index()].opening_placed = state.rules.opening_tokens;
        }

        for side in Side::BOTH {
            let total = state.rules.tokens_per_side();
            let on_board = state.on_board_count(side);
            let held_by_enemy = position.captives[side.opponent().index()];
            let free = total
                .checked_sub(on_board + held_by_enemy)
                .ok_or_else(|| anyhow::anyhow!("{} has more than {} tokens", side, total))?;
            let reserve = position.reserve[side.index()].unwrap_or(free);
            let void = free
                .checked_sub(reserve)
                .ok_or_else(|| anyhow::anyhow!("{} reserve exceeds free tokens", side))?;

            for _ in 0..held_by_enemy {
                let id = state.next_token_id(side);
                state.tokens.push(Token {
                    id,
                    location: Location::Captive { by: side.opponent() },
                });
            }
            for _ in 0..void {
                let id = state.next_token_id(side);
                state.tokens.push(Token {
                    id,
                    location: Location::Void,
                });
            }
            state.sides[side.index()].reserve = reserve;
            state.sides[side.index()].void = void;
            state.sides[side.opponent().index()].captive = held_by_enemy;
        }

        state.log.push(format!("Position set up: {} to act", state.active));
        Ok(state)
    }

    /// Deep copy for search. The log history is not carried over.
    pub fn fork(&self) -> Self {
        Self {
            version: self.version,
            rules: self.rules.clone(),
            phase: self.phase,
            active: self.active,
            turn: self.turn,
            round: self.round,
            sides: self.sides.clone(),
            tokens: self.tokens.clone(),
            deck: self.deck.clone(),
            queue: self.queue.clone(),
            used_routes: self.used_routes.clone(),
            pending_swap: self.pending_swap,
            pending_evasion: self.pending_evasion,
            early_swap_used: self.early_swap_used,
            extra_reinforcement_bought: self.extra_reinforcement_bought,
            reinforcements_to_place: self.reinforcements_to_place,
            last_invasion: self.last_invasion,
            log: Vec::new(),
            last_move: self.last_move.clone(),
            warning: None,
            game_over: self.game_over,
        }
    }

    // ========================================================================
    // SNAPSHOTS
    // ========================================================================

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Write guard for a sync layer: only the side to act may write
    pub fn ensure_turn_owner(&self, side: Side) -> Result<(), RuleViolation> {
        if self.game_over.is_some() {
            return Err(RuleViolation::GameOver);
        }
        if side != self.active {
            return Err(RuleViolation::NotYourTurn(side));
        }
        Ok(())
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Side to act
    pub fn active(&self) -> Side {
        self.active
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn side(&self, side: Side) -> &SideState {
        &self.sides[side.index()]
    }

    pub(crate) fn side_mut(&mut self, side: Side) -> &mut SideState {
        &mut self.sides[side.index()]
    }

    pub fn hand(&self, side: Side) -> &[Route] {
        &self.sides[side.index()].hand
    }

    pub fn queue(&self) -> &[Route] {
        &self.queue
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    /// Routes spent by the active side this turn
    pub fn used_routes(&self) -> &[Route] {
        &self.used_routes
    }

    pub fn pending_swap(&self) -> &PendingSwap {
        &self.pending_swap
    }

    pub fn pending_evasion(&self) -> Option<&PendingEvasion> {
        self.pending_evasion.as_ref()
    }

    pub fn early_swap_used(&self) -> bool {
        self.early_swap_used
    }

    pub fn extra_reinforcement_bought(&self) -> bool {
        self.extra_reinforcement_bought
    }

    pub fn reinforcements_to_place(&self) -> u32 {
        self.reinforcements_to_place
    }

    pub fn last_invasion(&self) -> Option<&InvasionRecord> {
        self.last_invasion.as_ref()
    }

    pub fn log(&self) -> &[String] {
        &self.log
    }

    pub fn last_move(&self) -> Option<&LastMove> {
        self.last_move.as_ref()
    }

    /// Text of the most recent rejected action, cleared by the next success
    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    pub fn game_over(&self) -> Option<GameOver> {
        self.game_over
    }

    pub fn is_over(&self) -> bool {
        self.game_over.is_some()
    }

    pub fn winner(&self) -> Option<Side> {
        self.game_over.map(|g| g.winner)
    }

    // ========================================================================
    // TOKENS
    // ========================================================================

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn token(&self, id: TokenId) -> Option<&Token> {
        self.tokens.iter().find(|t| t.id == id)
    }

    pub(crate) fn token_mut(&mut self, id: TokenId) -> Option<&mut Token> {
        self.tokens.iter_mut().find(|t| t.id == id)
    }

    /// Token standing on a square
    pub fn occupant(&self, at: Coord) -> Option<&Token> {
        self.tokens
            .iter()
            .find(|t| t.location == Location::Board(at))
    }

    /// Tokens of one side on the board
    pub fn board_tokens(&self, side: Side) -> impl Iterator<Item = &Token> + '_ {
        self.tokens
            .iter()
            .filter(move |t| t.owner() == side && matches!(t.location, Location::Board(_)))
    }

    pub fn on_board_count(&self, side: Side) -> u32 {
        self.board_tokens(side).count() as u32
    }

    /// Squares with no token on them
    pub fn empty_squares(&self) -> Vec<Coord> {
        let mut taken = [false; 36];
        for t in &self.tokens {
            if let Location::Board(c) = t.location {
                taken[c.index()] = true;
            }
        }
        Coord::all().filter(|c| !taken[c.index()]).collect()
    }

    pub(crate) fn next_token_id(&mut self, side: Side) -> TokenId {
        let state = self.side_mut(side);
        state.serial += 1;
        TokenId::new(side, state.serial)
    }

    /// Bring a reserve token onto the board
    pub(crate) fn spawn_token(&mut self, side: Side, at: Coord) -> TokenId {
        let id = self.next_token_id(side);
        self.side_mut(side).reserve -= 1;
        self.tokens.push(Token {
            id,
            location: Location::Board(at),
        });
        id
    }

    pub(crate) fn push_log(&mut self, entry: String) {
        self.log.push(entry);
    }
}

// ============================================================================
// TESTS
// ============================================================================
