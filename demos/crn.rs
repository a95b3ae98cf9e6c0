//! A chemical reaction network read from JSON and explored as a continuous-time Markov chain.
//! Each state holds one molecule count per species, and each transition weight is the firing
//! rate of a reaction.

// Shared by both demos, and neither uses every item.
#![allow(dead_code)]

use serde::Deserialize;
use statetrie::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Network {
    pub species: Vec<Species>,
    pub reactions: Vec<Reaction>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Species {
    pub name: String,
    #[serde(default)]
    pub initial: u32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Reaction {
    pub name: String,
    /// Species consumed, with stoichiometry.
    #[serde(default)]
    pub reactants: BTreeMap<String, u32>,
    /// Species produced, with stoichiometry.
    #[serde(default)]
    pub products: BTreeMap<String, u32>,
    pub rate: f64,
}

/// Upper bounds on species counts. Reactions that would exceed a bound do not fire.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Bounds {
    #[serde(default)]
    pub caps: BTreeMap<String, u32>,
}

/// The classic susceptible/infected/recovered epidemic over a fixed population.
pub fn sir(population: u32) -> Network {
    let species = |name: &str, initial| Species {
        name: name.to_owned(),
        initial,
    };
    let counts = |pairs: &[(&str, u32)]| {
        pairs
            .iter()
            .map(|&(name, n)| (name.to_owned(), n))
            .collect::<BTreeMap<_, _>>()
    };
    Network {
        species: vec![
            species("S", population.saturating_sub(1)),
            species("I", 1),
            species("R", 0),
        ],
        reactions: vec![
            Reaction {
                name: "infect".to_owned(),
                reactants: counts(&[("S", 1), ("I", 1)]),
                products: counts(&[("I", 2)]),
                rate: 0.02,
            },
            Reaction {
                name: "recover".to_owned(),
                reactants: counts(&[("I", 1)]),
                products: counts(&[("R", 1)]),
                rate: 0.1,
            },
        ],
    }
}

struct Compiled {
    name: String,
    rate: f64,
    reactants: Vec<(usize, u32)>,
    delta: Vec<i64>,
}

pub struct CrnGenerator {
    layout: SliceLayout,
    names: Vec<String>,
    initial: Vec<u32>,
    reactions: Vec<Compiled>,
    caps: Vec<Option<u32>>,
    current: Vec<u32>,
}

impl CrnGenerator {
    pub fn new(network: Network, bounds: Bounds, layout: SliceLayout) -> Result<Self, BoxError> {
        let names: Vec<String> = network.species.iter().map(|s| s.name.clone()).collect();
        let position = |name: &str| -> Result<usize, BoxError> {
            names
                .iter()
                .position(|n| n == name)
                .ok_or_else(|| format!("Unknown species {:?}.", name).into())
        };

        let mut reactions = Vec::with_capacity(network.reactions.len());
        for reaction in network.reactions {
            let mut reactants = Vec::new();
            let mut delta = vec![0i64; names.len()];
            for (name, &n) in &reaction.reactants {
                let i = position(name)?;
                reactants.push((i, n));
                delta[i] -= n as i64;
            }
            for (name, &n) in &reaction.products {
                delta[position(name)?] += n as i64;
            }
            reactions.push(Compiled {
                name: reaction.name,
                rate: reaction.rate,
                reactants,
                delta,
            });
        }

        let mut caps = vec![None; names.len()];
        for (name, &cap) in &bounds.caps {
            caps[position(name)?] = Some(cap);
        }

        Ok(CrnGenerator {
            layout,
            initial: network.species.iter().map(|s| s.initial).collect(),
            names,
            reactions,
            caps,
            current: Vec::new(),
        })
    }

    fn propensity(&self, reaction: &Compiled) -> f64 {
        reaction
            .reactants
            .iter()
            .fold(reaction.rate, |p, &(i, k)| p * choose(self.current[i], k))
    }

    fn fire(&self, reaction: &Compiled) -> Option<Vec<u32>> {
        self.current
            .iter()
            .zip(&reaction.delta)
            .zip(&self.caps)
            .map(|((&count, &delta), cap)| {
                let next = u32::try_from(count as i64 + delta).ok()?;
                match cap {
                    Some(cap) if next > *cap => None,
                    _ => Some(next),
                }
            })
            .collect()
    }
}

/// `n` choose `k` as a float, zero when `k > n`.
fn choose(n: u32, k: u32) -> f64 {
    if k > n {
        return 0.0;
    }
    (0..k).fold(1.0, |acc, j| acc * (n - j) as f64 / (j + 1) as f64)
}

impl Generator for CrnGenerator {
    fn field_names(&self) -> Vec<String> {
        self.names.clone()
    }

    fn initial_states(
        &mut self,
        assign: &mut AssignFn<'_>,
    ) -> Result<Vec<StateId>, ExploreError> {
        let state = StateBuffer::from_slices(&self.initial, &self.layout)?;
        Ok(assign(&state)?.id().into_iter().collect())
    }

    fn load(&mut self, state: &StateBuffer) -> Result<(), ExploreError> {
        let current = StateView::new(state, self.layout)?.to_vec();
        if current.len() != self.names.len() {
            return Err(ExploreError::generator(format!(
                "State holds {} counts for {} species.",
                current.len(),
                self.names.len()
            )));
        }
        self.current = current;
        Ok(())
    }

    fn expand(&mut self, assign: &mut AssignFn<'_>) -> Result<Behavior, ExploreError> {
        let mut choice = Vec::new();
        for reaction in &self.reactions {
            let propensity = self.propensity(reaction);
            if propensity <= 0.0 {
                continue;
            }
            let next = match self.fire(reaction) {
                Some(next) => next,
                None => continue,
            };
            let next = StateBuffer::from_slices(&next, &self.layout)?;
            match assign(&next)? {
                Assignment::Assigned(id) => choice.push((id, propensity)),
                skipped => log::trace!("Dropped {}. assignment={:?}", reaction.name, skipped),
            }
        }
        Ok(if choice.is_empty() { Vec::new() } else { vec![choice] })
    }
}

/// Reads [`Network`] models and optional [`Bounds`] property files as JSON.
pub struct CrnSource {
    layout: SliceLayout,
}

impl CrnSource {
    pub fn new(layout: SliceLayout) -> Self {
        CrnSource { layout }
    }
}

impl ModelSource for CrnSource {
    type Generator = CrnGenerator;

    fn open(&self, model: &Path, properties: Option<&Path>) -> Result<CrnGenerator, BoxError> {
        let network: Network = serde_json::from_str(&fs::read_to_string(model)?)?;
        let bounds: Bounds = match properties {
            Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
            None => Bounds::default(),
        };
        log::info!(
            "Opened network. species={}, reactions={}, caps={}",
            network.species.len(),
            network.reactions.len(),
            bounds.caps.len()
        );
        CrnGenerator::new(network, bounds, self.layout)
    }
}
