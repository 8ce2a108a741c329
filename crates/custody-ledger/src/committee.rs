//! Committee roster and quorum threshold
//!
//! The roster is fixed at construction and immutable afterwards. Iteration
//! order is the construction order, which is also the order the quorum
//! check walks.

use std::collections::HashSet;

use custody_common::{ConfigViolation, PrincipalId};
use serde::{Deserialize, Serialize};

/// Validated principal set plus threshold M
#[derive(Debug, Clone)]
pub struct Committee {
    members: Vec<PrincipalId>,
    index: HashSet<PrincipalId>,
    threshold: u32,
}

/// Persisted form of a committee
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitteeRecord {
    pub members: Vec<PrincipalId>,
    pub threshold: u32,
}

impl Committee {
    /// Validate and build a committee
    ///
    /// Checks run in a fixed order: roster non-empty, then `1 <= threshold
    /// <= N`, then each principal in roster order must be non-null and not
    /// seen before.
    pub fn new(members: Vec<PrincipalId>, threshold: u32) -> Result<Self, ConfigViolation> {
        if members.is_empty() {
            return Err(ConfigViolation::OwnersRequired);
        }

        if threshold == 0 || threshold as usize > members.len() {
            return Err(ConfigViolation::InvalidRequiredOwners {
                required: threshold,
                owners: members.len(),
            });
        }

        let mut index = HashSet::with_capacity(members.len());
        for member in &members {
            if member.is_zero() {
                return Err(ConfigViolation::InvalidOwner);
            }
            if !index.insert(*member) {
                return Err(ConfigViolation::OwnerNotUnique { owner: *member });
            }
        }

        Ok(Self {
            members,
            index,
            threshold,
        })
    }

    /// Rebuild from a persisted record, re-running validation
    pub fn from_record(record: CommitteeRecord) -> Result<Self, ConfigViolation> {
        Self::new(record.members, record.threshold)
    }

    pub fn to_record(&self) -> CommitteeRecord {
        CommitteeRecord {
            members: self.members.clone(),
            threshold: self.threshold,
        }
    }

    #[inline]
    pub fn is_member(&self, principal: &PrincipalId) -> bool {
        self.index.contains(principal)
    }

    /// Members in construction order
    pub fn members(&self) -> &[PrincipalId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always false for a validated committee
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Quorum predicate with early exit
    ///
    /// Walks members in roster order and stops the moment `threshold`
    /// approvals have been counted. `approved` is consulted at most once
    /// per member.
    pub fn quorum_reached<E>(
        &self,
        mut approved: impl FnMut(&PrincipalId) -> Result<bool, E>,
    ) -> Result<bool, E> {
        let mut count = 0u32;
        for member in &self.members {
            if approved(member)? {
                count += 1;
            }
            if count == self.threshold {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Full approval count, no early exit
    pub fn count_approvals<E>(
        &self,
        mut approved: impl FnMut(&PrincipalId) -> Result<bool, E>,
    ) -> Result<u32, E> {
        let mut count = 0u32;
        for member in &self.members {
            if approved(member)? {
                count += 1;
            }
        }
        Ok(count)
    }
}
