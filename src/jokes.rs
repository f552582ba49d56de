use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum JokeCategory {
    General,
    Animal,
    Tech,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FallbackJoke {
    pub category: JokeCategory,
    pub text: &'static str,
}

const fn joke(category: JokeCategory, text: &'static str) -> FallbackJoke {
    FallbackJoke { category, text }
}

static FALLBACK_JOKES: &[FallbackJoke] = &[
    joke(JokeCategory::General, "Why don't scientists trust atoms? Because they make up everything!"),
    joke(JokeCategory::General, "Why did the scarecrow win an award? Because he was outstanding in his field!"),
    joke(JokeCategory::General, "Why did the math book look sad? Because it had too many problems!"),
    joke(JokeCategory::General, "Why did the bicycle fall over? Because it was two-tired!"),
    joke(JokeCategory::General, "Why can't you give Elsa a balloon? Because she will let it go!"),
    joke(JokeCategory::Animal, "Why do cows have hooves instead of feet? Because they lactose!"),
    joke(JokeCategory::Animal, "What do you call a fish wearing a bowtie? Sofishticated."),
    joke(JokeCategory::Animal, "Why did the chicken join a band? Because it had the drumsticks!"),
    joke(JokeCategory::Tech, "Why do programmers prefer dark mode? Because light attracts bugs!"),
    joke(JokeCategory::Tech, "Why was the computer cold? It left its Windows open!"),
    joke(JokeCategory::Tech, "Why did the smartphone need glasses? Because it lost its contacts!"),
];

/// Immutable canned jokes. Never empty.
#[derive(Debug, Clone, Copy)]
pub struct FallbackJokeStore {
    jokes: &'static [FallbackJoke],
}

impl Default for FallbackJokeStore {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FallbackJokeStore {
    pub fn builtin() -> Self {
        Self {
            jokes: FALLBACK_JOKES,
        }
    }

    pub fn len(&self) -> usize {
        self.jokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jokes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static FallbackJoke> {
        self.jokes.iter()
    }

    pub fn contains(&self, text: &str) -> bool {
        self.jokes.iter().any(|j| j.text == text)
    }

    /// Uniform pick across every category.
    pub fn random(&self) -> &'static str {
        self.random_with(&mut rand::thread_rng())
    }

    pub fn random_with<R: Rng + ?Sized>(&self, rng: &mut R) -> &'static str {
        self.jokes
            .choose(rng)
            .map(|j| j.text)
            .unwrap_or(FALLBACK_JOKES[0].text)
    }
}
