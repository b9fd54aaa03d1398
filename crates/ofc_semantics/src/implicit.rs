// Copyright contributors to the ofc project
// SPDX-License-Identifier: Apache-2.0

//! Implicit typing: the type given to an undeclared name by its first letter.

use crate::semantic_error::{invalid_declaration, SemaResult};
use crate::types::{TypeInterner, TypeRef};

#[derive(Clone, Debug, PartialEq)]
pub struct ImplicitRules {
    letters: [Option<TypeRef>; 26],
    // Letters already set by an IMPLICIT statement in this scope.
    explicit: u32,
}

fn letter_index(c: char) -> Option<usize> {
    c.is_ascii_alphabetic()
        .then(|| usize::from(c.to_ascii_uppercase() as u8 - b'A'))
}

impl ImplicitRules {
    /// I through N are INTEGER, everything else REAL.
    pub fn standard(types: &mut TypeInterner) -> ImplicitRules {
        let integer = types.integer();
        let real = types.real();
        let letters = std::array::from_fn(|i| {
            let letter = b'A' + i as u8;
            if (b'I'..=b'N').contains(&letter) {
                Some(integer.clone())
            } else {
                Some(real.clone())
            }
        });
        ImplicitRules {
            letters,
            explicit: 0,
        }
    }

    /// `IMPLICIT NONE`
    pub fn none() -> ImplicitRules {
        ImplicitRules {
            letters: Default::default(),
            explicit: 0,
        }
    }

    /// Apply `IMPLICIT ty (start-end)`. A letter may be mentioned by at most one
    /// IMPLICIT statement per scope.
    pub fn set_range(&mut self, start: char, end: char, ty: &TypeRef) -> SemaResult<()> {
        let (Some(first), Some(last)) = (letter_index(start), letter_index(end)) else {
            return Err(invalid_declaration(format!(
                "implicit range {start}-{end} is not made of letters"
            )));
        };
        if first > last {
            return Err(invalid_declaration(format!(
                "implicit range {start}-{end} is backwards"
            )));
        }
        let mask = (first..=last).fold(0u32, |mask, i| mask | (1 << i));
        if self.explicit & mask != 0 {
            return Err(invalid_declaration(format!(
                "implicit type for a letter in {start}-{end} was already given"
            )));
        }
        self.explicit |= mask;
        for slot in &mut self.letters[first..=last] {
            *slot = Some(ty.clone());
        }
        Ok(())
    }

    /// The implicit type of `name`, or `None` under IMPLICIT NONE.
    pub fn type_for(&self, name: &str) -> Option<&TypeRef> {
        let index = name.chars().next().and_then(letter_index)?;
        self.letters[index].as_ref()
    }

    pub fn is_none(&self) -> bool {
        self.letters.iter().all(Option::is_none)
    }
}

#[test]
fn test_standard_rules() {
    let mut types = TypeInterner::new();
    let rules = ImplicitRules::standard(&mut types);
    assert_eq!(rules.type_for("COUNT"), Some(&types.real()));
    assert_eq!(rules.type_for("index"), Some(&types.integer()));
    assert_eq!(rules.type_for("_X"), None);
}

#[test]
fn test_overlapping_ranges_rejected() {
    let mut types = TypeInterner::new();
    let double = types.double();
    let mut rules = ImplicitRules::standard(&mut types);
    rules.set_range('A', 'H', &double).unwrap();
    assert!(rules.set_range('H', 'H', &double).is_err());
    assert!(rules.set_range('Z', 'O', &double).is_err());
    assert_eq!(rules.type_for("DX"), Some(&double));
}
