//! Feature effects - what picking a class, race or background feature does.
//!
//! A feature carries an ordered list of effects. Compiling them folds the
//! effects, plus the user's picks for any open choices, into one `Choice`
//! for the feature's scope.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::record::{Choice, Field, FieldValue};
use crate::value_objects::{Ability, ScopeId, ScopeMeta};

/// String list a feature can add to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListTarget {
    Skills,
    Proficiencies,
    Languages,
    Features,
}

impl ListTarget {
    pub fn field(&self) -> Field {
        match self {
            Self::Skills => Field::Skills,
            Self::Proficiencies => Field::Proficiencies,
            Self::Languages => Field::Languages,
            Self::Features => Field::Features,
        }
    }
}

/// Scalar a feature can set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarTarget {
    Race,
    Subrace,
    Class,
    Subclass,
    Background,
    Alignment,
}

impl ScalarTarget {
    pub fn field(&self) -> Field {
        match self {
            Self::Race => Field::Race,
            Self::Subrace => Field::Subrace,
            Self::Class => Field::Class,
            Self::Subclass => Field::Subclass,
            Self::Background => Field::Background,
            Self::Alignment => Field::Alignment,
        }
    }
}

/// One effect of a feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureEffect {
    SetScore {
        ability: Ability,
        score: u8,
    },
    SetScalar {
        target: ScalarTarget,
        value: String,
    },
    AddToList {
        target: ListTarget,
        values: Vec<String>,
    },
    /// Cancels values added earlier by the same feature
    RemoveFromList {
        target: ListTarget,
        values: Vec<String>,
    },
    ChooseFromList {
        target: ListTarget,
        options: Vec<String>,
        count: usize,
    },
}

/// Whether the effect waits on a user pick.
///
/// A choice offering no more options than it grants is applied whole.
pub fn effect_needs_choice(effect: &FeatureEffect) -> bool {
    match effect {
        FeatureEffect::ChooseFromList { options, count, .. } => options.len() > *count,
        _ => false,
    }
}

/// Fold a feature's effects and the user's picks into one scope contribution.
///
/// Picks are matched to open choices in effect order; a pick belongs to the
/// first choice that offers it and still has room.
///
/// # Errors
///
/// Returns `DomainError::Validation` if a pick is not offered by any open
/// choice, or a choice receives more picks than it grants.
pub fn compile_effects(
    scope: ScopeId,
    meta: ScopeMeta,
    effects: &[FeatureEffect],
    picks: &[String],
) -> Result<Choice, DomainError> {
    let mut lists: Vec<(ListTarget, Vec<String>)> = Vec::new();
    let mut choice = Choice::new(scope, meta);
    let mut unassigned: Vec<&String> = picks.iter().collect();

    fn list_for(lists: &mut Vec<(ListTarget, Vec<String>)>, target: ListTarget) -> &mut Vec<String> {
        let index = match lists.iter().position(|(t, _)| *t == target) {
            Some(index) => index,
            None => {
                lists.push((target, Vec::new()));
                lists.len() - 1
            }
        };
        &mut lists[index].1
    }

    for effect in effects {
        match effect {
            FeatureEffect::SetScore { ability, score } => {
                choice = choice.ability_base(*ability, *score);
            }
            FeatureEffect::SetScalar { target, value } => {
                choice = choice.change(target.field(), FieldValue::Text(value.clone()))?;
            }
            FeatureEffect::AddToList { target, values } => {
                list_for(&mut lists, *target).extend(values.iter().cloned());
            }
            FeatureEffect::RemoveFromList { target, values } => {
                let list = list_for(&mut lists, *target);
                for value in values {
                    if let Some(pos) = list.iter().position(|v| v == value) {
                        list.remove(pos);
                    }
                }
            }
            FeatureEffect::ChooseFromList { target, options, count } => {
                if !effect_needs_choice(effect) {
                    list_for(&mut lists, *target).extend(options.iter().cloned());
                    continue;
                }
                let mut taken = Vec::new();
                unassigned.retain(|pick| {
                    if taken.len() < *count && options.contains(pick) {
                        taken.push((*pick).clone());
                        false
                    } else {
                        true
                    }
                });
                list_for(&mut lists, *target).extend(taken);
            }
        }
    }

    if let Some(stray) = unassigned.first() {
        return Err(DomainError::validation(format!(
            "'{}' is not offered by any open choice of this feature",
            stray
        )));
    }

    for (target, values) in lists {
        if !values.is_empty() {
            choice = choice.change(target.field(), FieldValue::Strings(values))?;
        }
    }

    Ok(choice)
}
