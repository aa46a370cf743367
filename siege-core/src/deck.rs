//! Cycling route deck

use crate::routes::{route_catalog, Route};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Ring buffer of routes: draw from the front, discard to the back.
///
/// Cards are never created or destroyed after `shuffled`; as long as every
/// draw is matched by a discard the deck cycles forever.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    cards: VecDeque<Route>,
}

impl Deck {
    /// Build `copies` of every catalog route and shuffle them
    pub fn shuffled<R: Rng>(copies: usize, rng: &mut R) -> Self {
        let mut cards: Vec<Route> = route_catalog()
            .into_iter()
            .flat_map(|route| std::iter::repeat(route).take(copies))
            .collect();
        cards.shuffle(rng);
        Self { cards: cards.into() }
    }

    /// Deck with a fixed order, front first
    pub fn from_cards(cards: Vec<Route>) -> Self {
        Self { cards: cards.into() }
    }

    /// Take the front card.
    ///
    /// # Panics
    /// An empty deck means routes leaked somewhere in the engine.
    pub fn draw(&mut self) -> Route {
        self.cards
            .pop_front()
            .expect("route deck exhausted: route conservation broken")
    }

    /// Return a card to the back
    pub fn discard(&mut self, route: Route) {
        self.cards.push_back(route);
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Cards front to back
    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.cards.iter()
    }
}
