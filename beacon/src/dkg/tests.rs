// This file is part of Gear.

// Copyright (C) 2025 Gear Technologies Inc.
// SPDX-License-Identifier: GPL-3.0-or-later WITH Classpath-exception-2.0

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use super::*;
use crate::config::BeaconParams;
use beacon_bls::{ark_std::test_rng, mock::ThresholdKeys};
use proptest::{proptest, test_runner::Config as ProptestConfig};

const START: BlockNumber = 100;
const STEP: BlockNumber = 2;

fn init_logger() {
    let _ = tracing_subscriber::fmt::try_init();
}

fn config(group_size: usize, group_threshold: usize) -> BeaconConfig {
    BeaconParams {
        group_size: Some(group_size),
        group_threshold: Some(group_threshold),
        result_publication_block_step: Some(STEP),
        ..Default::default()
    }
    .into_config()
    .unwrap()
}

fn participants(count: u64) -> Vec<Address> {
    (1..=count).map(Address::from).collect()
}

struct Setup {
    validator: DkgResultValidator,
    participants: Vec<Address>,
    keys: ThresholdKeys,
}

fn setup() -> Setup {
    init_logger();

    let participants = participants(5);
    let mut validator = DkgResultValidator::new(&config(5, 3));
    validator.open_round(participants.clone(), START);

    Setup {
        validator,
        participants,
        keys: ThresholdKeys::generate(5, 3, &mut test_rng()),
    }
}

fn signed_result(
    keys: &ThresholdKeys,
    misbehaved: MisbehavedMembers,
    signers: &[ShareIndex],
) -> DkgResult {
    let public_key = keys.public_key();
    let digest = result_digest(&public_key, &misbehaved, keys.size());

    DkgResult {
        submitter_index: 1,
        group_public_key: public_key,
        misbehaved,
        signatures: keys.sign_shares(signers, &digest),
        signing_member_indices: signers.to_vec(),
    }
}

#[test]
fn valid_result_without_misbehavior() {
    let Setup {
        mut validator,
        participants,
        keys,
    } = setup();

    let result = signed_result(&keys, Default::default(), &[1, 2, 3]);
    let accepted = validator.submit_result(participants[0], &result, START).unwrap();

    assert_eq!(accepted.public_key, keys.public_key());
    assert_eq!(accepted.members, participants);
    assert!(accepted.disqualified.is_empty());
    assert_eq!(validator.update_state(START), Some(DkgRoundState::Accepted));

    // Only one result per round.
    assert_eq!(
        validator.submit_result(participants[0], &result, START),
        Err(DkgResultError::NoResultExpected)
    );
}

#[test]
fn misbehaved_members_are_excluded() {
    let Setup {
        mut validator,
        participants,
        keys,
    } = setup();

    let result = signed_result(&keys, MisbehavedMembers::new([3], []), &[1, 2, 4, 5]);
    let accepted = validator.submit_result(participants[0], &result, START).unwrap();

    assert_eq!(
        accepted.members,
        vec![participants[0], participants[1], participants[3], participants[4]]
    );
    assert!(accepted.disqualified.is_empty());
}

#[test]
fn disqualified_members_are_reported() {
    let Setup {
        mut validator,
        participants,
        keys,
    } = setup();

    let result = signed_result(&keys, MisbehavedMembers::new([5], [2]), &[1, 3, 4]);
    let accepted = validator.submit_result(participants[0], &result, START).unwrap();

    assert_eq!(
        accepted.members,
        vec![participants[0], participants[2], participants[3]]
    );
    assert_eq!(accepted.disqualified, vec![participants[1]]);
}

#[test]
fn submission_rights_are_staggered() {
    let Setup {
        mut validator,
        participants,
        keys,
    } = setup();

    let mut result = signed_result(&keys, Default::default(), &[1, 2, 3]);
    result.submitter_index = 3;

    assert_eq!(validator.eligible_at(1), Some(START));
    assert_eq!(validator.eligible_at(3), Some(START + 2 * STEP));

    assert_eq!(
        validator.submit_result(participants[2], &result, START + 2 * STEP - 1),
        Err(DkgResultError::NotEligibleYet {
            eligible_at: START + 2 * STEP
        })
    );

    // First participant can't publish before the window either.
    result.submitter_index = 1;
    assert_eq!(
        validator.submit_result(participants[0], &result, START - 1),
        Err(DkgResultError::NotEligibleYet { eligible_at: START })
    );

    result.submitter_index = 3;
    assert!(
        validator
            .submit_result(participants[2], &result, START + 2 * STEP)
            .is_ok()
    );
}

#[test]
fn submitter_must_be_selected_participant() {
    let Setup {
        mut validator,
        participants,
        keys,
    } = setup();

    let mut result = signed_result(&keys, Default::default(), &[1, 2, 3]);

    assert_eq!(
        validator.submit_result(Address::from(99u64), &result, START),
        Err(DkgResultError::NotSelectedParticipant)
    );

    // Position doesn't belong to the submitter.
    result.submitter_index = 2;
    assert_eq!(
        validator.submit_result(participants[0], &result, START + STEP),
        Err(DkgResultError::NotSelectedParticipant)
    );

    result.submitter_index = 0;
    assert_eq!(
        validator.submit_result(participants[0], &result, START),
        Err(DkgResultError::NotSelectedParticipant)
    );

    result.submitter_index = 6;
    assert_eq!(
        validator.submit_result(participants[0], &result, START),
        Err(DkgResultError::NotSelectedParticipant)
    );
}

#[test]
fn signer_indices_are_checked() {
    let Setup {
        mut validator,
        participants,
        keys,
    } = setup();
    let submitter = participants[0];

    let mut result = signed_result(&keys, Default::default(), &[1, 2, 3]);

    result.signing_member_indices = vec![1, 2, 6];
    assert_eq!(
        validator.submit_result(submitter, &result, START),
        Err(DkgResultError::UnknownSigner(6))
    );

    result.signing_member_indices = vec![0, 1, 2];
    assert_eq!(
        validator.submit_result(submitter, &result, START),
        Err(DkgResultError::UnknownSigner(0))
    );

    result.signing_member_indices = vec![1, 2, 2];
    assert_eq!(
        validator.submit_result(submitter, &result, START),
        Err(DkgResultError::DuplicateSignerIndex(2))
    );

    // Two valid shares are not enough, regardless of their validity.
    let result = signed_result(&keys, Default::default(), &[1, 2]);
    assert_eq!(
        validator.submit_result(submitter, &result, START),
        Err(DkgResultError::InsufficientSignatures {
            provided: 2,
            required: 3
        })
    );

    assert_eq!(validator.update_state(START), Some(DkgRoundState::AwaitingResult));
}

#[test]
fn quorum_signature_must_match_result() {
    let Setup {
        mut validator,
        participants,
        keys,
    } = setup();
    let submitter = participants[0];

    // Signed without the misbehavior claimed in the result.
    let mut result = signed_result(&keys, Default::default(), &[1, 2, 3]);
    result.misbehaved = MisbehavedMembers::new([4], []);
    assert_eq!(
        validator.submit_result(submitter, &result, START),
        Err(DkgResultError::InvalidQuorumSignature)
    );

    // Shares of another group.
    let mut rng = test_rng();
    let _ = ThresholdKeys::generate(5, 3, &mut rng);
    let other = ThresholdKeys::generate(5, 3, &mut rng);
    assert_ne!(other.public_key(), keys.public_key());
    let mut result = signed_result(&keys, Default::default(), &[1, 2, 3]);
    result.signatures = signed_result(&other, Default::default(), &[1, 2, 3]).signatures;
    assert_eq!(
        validator.submit_result(submitter, &result, START),
        Err(DkgResultError::InvalidQuorumSignature)
    );

    // Shares attributed to the wrong signers.
    let mut result = signed_result(&keys, Default::default(), &[1, 2, 3]);
    result.signing_member_indices = vec![1, 2, 4];
    assert_eq!(
        validator.submit_result(submitter, &result, START),
        Err(DkgResultError::InvalidQuorumSignature)
    );

    let mut result = signed_result(&keys, Default::default(), &[1, 2, 3]);
    result.signatures.pop();
    assert_eq!(
        validator.submit_result(submitter, &result, START),
        Err(DkgResultError::MalformedSignatures {
            actual: 3 * SIGNATURE_LENGTH - 1,
            expected: 3 * SIGNATURE_LENGTH
        })
    );

    let mut result = signed_result(&keys, Default::default(), &[1, 2, 3]);
    result.group_public_key = PublicKey([0xff; beacon_bls::PUBLIC_KEY_LENGTH]);
    assert_eq!(
        validator.submit_result(submitter, &result, START),
        Err(DkgResultError::Bls(BlsError::InvalidPoint))
    );

    let result = signed_result(&keys, Default::default(), &[1, 2, 3]);
    assert!(validator.submit_result(submitter, &result, START).is_ok());
}

#[test]
fn misbehavior_is_bounded() {
    let Setup {
        mut validator,
        participants,
        keys,
    } = setup();
    let submitter = participants[0];

    let result = signed_result(&keys, MisbehavedMembers::new([6], []), &[1, 2, 3]);
    assert_eq!(
        validator.submit_result(submitter, &result, START),
        Err(DkgResultError::MisbehaviorOutOfRange(6))
    );

    let result = signed_result(&keys, MisbehavedMembers::new([], [0]), &[1, 2, 3]);
    assert_eq!(
        validator.submit_result(submitter, &result, START),
        Err(DkgResultError::MisbehaviorOutOfRange(0))
    );

    let result = signed_result(&keys, MisbehavedMembers::new([4], [5, 2]), &[1, 2, 3]);
    assert_eq!(
        validator.submit_result(submitter, &result, START),
        Err(DkgResultError::TooManyMisbehaved {
            remaining: 2,
            required: 3
        })
    );
}

#[test]
fn round_is_rejected_after_publication_window() {
    let Setup {
        mut validator,
        participants,
        keys,
    } = setup();

    let end = START + 5 * STEP;
    assert_eq!(validator.publication_end(), Some(end));

    let mut result = signed_result(&keys, Default::default(), &[1, 2, 3]);
    result.submitter_index = 5;
    assert_eq!(
        validator.submit_result(participants[4], &result, end),
        Err(DkgResultError::ResultPublicationTimedOut)
    );
    assert_eq!(validator.round().map(|r| r.state), Some(DkgRoundState::Rejected));

    // Terminal.
    assert_eq!(
        validator.submit_result(participants[4], &result, end - 1),
        Err(DkgResultError::ResultPublicationTimedOut)
    );
}

#[test]
fn no_round_no_result() {
    let keys = ThresholdKeys::generate(3, 2, &mut test_rng());
    let mut validator = DkgResultValidator::new(&config(3, 2));

    let result = signed_result(&keys, Default::default(), &[1, 2]);
    assert_eq!(
        validator.submit_result(Address::from(1u64), &result, START),
        Err(DkgResultError::NoResultExpected)
    );
    assert_eq!(validator.update_state(START), None);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn below_threshold_results_are_rejected(
        size in 1usize..16,
        threshold_seed in 0usize..16,
        signers_seed in 0usize..16,
    ) {
        let threshold = 1 + threshold_seed % size;
        let signers = signers_seed % threshold;
        let participants = participants(size as u64);

        let mut validator = DkgResultValidator::new(&config(size, threshold));
        validator.open_round(participants.clone(), START);

        let result = DkgResult {
            submitter_index: 1,
            group_public_key: PublicKey([0; beacon_bls::PUBLIC_KEY_LENGTH]),
            misbehaved: Default::default(),
            signatures: vec![0; signers * SIGNATURE_LENGTH],
            signing_member_indices: (1..=signers as ShareIndex).collect(),
        };

        assert_eq!(
            validator.submit_result(participants[0], &result, START),
            Err(DkgResultError::InsufficientSignatures {
                provided: signers,
                required: threshold
            })
        );
    }

    #[test]
    fn duplicate_signers_are_rejected(size in 2usize..16, duplicate_seed in 0usize..16) {
        let participants = participants(size as u64);
        let mut validator = DkgResultValidator::new(&config(size, 1));
        validator.open_round(participants.clone(), START);

        let duplicate = (1 + duplicate_seed % size) as ShareIndex;
        let mut signers: Vec<ShareIndex> = (1..=size as ShareIndex).collect();
        signers.push(duplicate);

        let result = DkgResult {
            submitter_index: 1,
            group_public_key: PublicKey([0; beacon_bls::PUBLIC_KEY_LENGTH]),
            misbehaved: Default::default(),
            signatures: vec![0; signers.len() * SIGNATURE_LENGTH],
            signing_member_indices: signers,
        };

        assert_eq!(
            validator.submit_result(participants[0], &result, START),
            Err(DkgResultError::DuplicateSignerIndex(duplicate))
        );
    }
}
