use proptest::prelude::*;

use plenum_governance::{
    Governor, Proposal, ProposalAction, ProposalId, ProposalState, RecordingDispatcher,
    SignatureAuthorizer, VotingPowerLedger,
};
use plenum_ledger::TokenLedger;
use plenum_types::{Address, Clock, GovernanceConfig, Timestamp, TokenAmount};
use std::collections::HashMap;
use std::sync::Arc;

fn account(seed: u8) -> Address {
    Address::new([seed; 32])
}

fn action() -> ProposalAction {
    ProposalAction {
        target: account(200),
        value: TokenAmount::ZERO,
        signature: String::new(),
        calldata: vec![1],
    }
}

fn governor_with(
    ledger: Arc<TokenLedger>,
) -> Governor<Arc<TokenLedger>, Arc<RecordingDispatcher>> {
    Governor::new(
        GovernanceConfig::default(),
        ledger,
        Arc::new(RecordingDispatcher::new()),
    )
    .expect("default config is valid")
}

proptest! {
    /// Proposal ids are strictly increasing and start at 1.
    #[test]
    fn proposal_ids_strictly_increase(count in 1usize..16) {
        let ledger = Arc::new(TokenLedger::new());
        let proposer = account(1);
        ledger.mint(&proposer, TokenAmount::new(10_000)).unwrap();
        let mut governor = governor_with(ledger);

        for i in 0..count {
            let id = governor
                .propose(
                    Clock::at(10 + i as u64, 0),
                    proposer,
                    vec![action()],
                    format!("proposal {i}"),
                )
                .unwrap();
            prop_assert_eq!(id.value(), i as u64 + 1);
        }
    }

    /// The three tally buckets always equal the sum of the receipts.
    #[test]
    fn tallies_match_receipts(
        votes in prop::collection::vec((1u128..1_000, 0u8..3), 1..12),
    ) {
        let ledger = Arc::new(TokenLedger::new());
        let proposer = account(1);
        ledger.mint(&proposer, TokenAmount::new(10_000)).unwrap();

        let voters: Vec<Address> = (0..votes.len())
            .map(|i| account(50 + i as u8))
            .collect();
        for (voter, (balance, _)) in voters.iter().zip(&votes) {
            ledger.mint(voter, TokenAmount::new(*balance)).unwrap();
        }

        let mut governor = governor_with(ledger);
        let id = governor
            .propose(Clock::at(10, 0), proposer, vec![action()], "tally check")
            .unwrap();
        let active = Clock::at(12, 0);

        let mut expected: HashMap<u8, u128> = HashMap::new();
        for (voter, (balance, support)) in voters.iter().zip(&votes) {
            governor
                .cast_vote(active, *voter, id, *support, None)
                .unwrap();
            *expected.entry(*support).or_default() += balance;
        }

        let proposal = governor.proposal(id).unwrap();
        prop_assert_eq!(
            proposal.against_votes.raw(),
            expected.get(&0).copied().unwrap_or(0)
        );
        prop_assert_eq!(
            proposal.for_votes.raw(),
            expected.get(&1).copied().unwrap_or(0)
        );
        prop_assert_eq!(
            proposal.abstain_votes.raw(),
            expected.get(&2).copied().unwrap_or(0)
        );
        prop_assert_eq!(proposal.receipts.len(), votes.len());

        let receipt_sum: u128 = proposal.receipts.values().map(|r| r.votes.raw()).sum();
        let tally_sum = proposal.for_votes.raw()
            + proposal.against_votes.raw()
            + proposal.abstain_votes.raw();
        prop_assert_eq!(receipt_sum, tally_sum);
    }

    /// The canceled flag dominates every other field and both clocks.
    #[test]
    fn canceled_dominates_all_clocks(
        height in any::<u64>(),
        time in any::<u64>(),
        for_votes in any::<u64>(),
        against_votes in any::<u64>(),
        executed in any::<bool>(),
        eta in any::<u64>(),
        quorum in any::<u64>(),
    ) {
        let proposal = Proposal {
            id: ProposalId::new(1),
            proposer: account(1),
            actions: vec![action()],
            description: String::new(),
            start_height: plenum_types::BlockHeight::new(100),
            end_height: plenum_types::BlockHeight::new(200),
            for_votes: TokenAmount::new(for_votes as u128),
            against_votes: TokenAmount::new(against_votes as u128),
            abstain_votes: TokenAmount::ZERO,
            canceled: true,
            executed,
            eta: Timestamp::new(eta),
            receipts: HashMap::new(),
        };
        let state = proposal.state(
            Clock::at(height, time),
            TokenAmount::new(quorum as u128),
            1_209_600,
        );
        prop_assert_eq!(state, ProposalState::Canceled);
    }

    /// The state function is total and lands in exactly one variant for
    /// arbitrary stored fields and clocks.
    #[test]
    fn state_is_total(
        height in any::<u64>(),
        time in any::<u64>(),
        start in 0u64..1_000_000,
        len in 1u64..1_000_000,
        for_votes in any::<u64>(),
        against_votes in any::<u64>(),
        executed in any::<bool>(),
        eta in any::<u64>(),
        quorum in any::<u64>(),
    ) {
        let proposal = Proposal {
            id: ProposalId::new(1),
            proposer: account(1),
            actions: vec![action()],
            description: String::new(),
            start_height: plenum_types::BlockHeight::new(start),
            end_height: plenum_types::BlockHeight::new(start + len),
            for_votes: TokenAmount::new(for_votes as u128),
            against_votes: TokenAmount::new(against_votes as u128),
            abstain_votes: TokenAmount::ZERO,
            canceled: false,
            executed,
            eta: Timestamp::new(eta),
            receipts: HashMap::new(),
        };
        let state = proposal.state(
            Clock::at(height, time),
            TokenAmount::new(quorum as u128),
            1_209_600,
        );
        // Exercising the derivation must never panic, and an executed flag
        // can only surface once the window passed with a winning tally.
        if state == ProposalState::Executed {
            prop_assert!(height > start + len);
            prop_assert!(executed);
            prop_assert_ne!(eta, 0);
        }
    }

    /// Nonces are consumed strictly sequentially per signer.
    #[test]
    fn nonces_consume_sequentially(steps in 1usize..24) {
        let mut authorizer = SignatureAuthorizer::default();
        let signer = account(7);
        for expected in 0..steps {
            prop_assert_eq!(authorizer.nonce(&signer), expected as u64);
            authorizer.consume_nonce(&signer);
        }
        prop_assert_eq!(authorizer.nonce(&signer), steps as u64);
    }

    /// Delegating and then clearing restores the target's aggregate.
    #[test]
    fn delegation_roundtrip_conserves_aggregates(balance in 1u128..1_000_000_000) {
        let ledger = TokenLedger::new();
        let delegator = account(1);
        let target = account(2);
        ledger.mint(&delegator, TokenAmount::new(balance)).unwrap();

        let mut power = VotingPowerLedger::new();
        let before = power.delegated_votes(&target);
        power.delegate(&ledger, &delegator, &target);
        prop_assert_eq!(
            power.delegated_votes(&target),
            before.saturating_add(TokenAmount::new(balance))
        );
        power.delegate(&ledger, &delegator, &Address::ZERO);
        prop_assert_eq!(power.delegated_votes(&target), before);
    }
}
