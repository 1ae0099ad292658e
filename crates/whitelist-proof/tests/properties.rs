//! Property tests for the whitelist tree.

use proptest::prelude::*;
use whitelist_proof::{leaf_hash, verify, verify_address, Address, WhitelistError, WhitelistTree};

fn address() -> impl Strategy<Value = Address> {
    any::<[u8; 20]>().prop_map(Address::from)
}

fn whitelist() -> impl Strategy<Value = Vec<Address>> {
    prop::collection::vec(address(), 1..64)
}

proptest! {
    #[test]
    fn every_member_proof_verifies(members in whitelist()) {
        let tree = WhitelistTree::build(&members).unwrap();
        for member in &members {
            let proof = tree.proof(member).unwrap();
            prop_assert_eq!(proof.len(), tree.depth());
            prop_assert!(verify(&tree.root(), &leaf_hash(member), &proof));
        }
    }

    #[test]
    fn outsiders_are_not_found(members in whitelist(), outsider in address()) {
        prop_assume!(!members.contains(&outsider));
        let tree = WhitelistTree::build(&members).unwrap();
        prop_assert_eq!(tree.proof(&outsider), Err(WhitelistError::NotFound(outsider)));
    }

    #[test]
    fn root_ignores_listing_order(
        (members, shuffled) in whitelist()
            .prop_flat_map(|m| (Just(m.clone()), Just(m).prop_shuffle())),
    ) {
        let tree = WhitelistTree::build(&members).unwrap();
        prop_assert_eq!(WhitelistTree::build(&shuffled).unwrap().root(), tree.root());
    }

    #[test]
    fn rebuild_is_deterministic(members in whitelist(), pick in any::<prop::sample::Index>()) {
        let first = WhitelistTree::build(&members).unwrap();
        let second = WhitelistTree::build(&members).unwrap();
        let member = pick.get(&members);

        prop_assert_eq!(first.root(), second.root());
        prop_assert_eq!(first.proof(member).unwrap(), second.proof(member).unwrap());
    }

    #[test]
    fn tampered_proof_fails(
        members in prop::collection::vec(address(), 2..64),
        pick in any::<prop::sample::Index>(),
        position in any::<prop::sample::Index>(),
        flip in 1u8..=255,
    ) {
        let tree = WhitelistTree::build(&members).unwrap();
        let member = pick.get(&members);
        let mut proof = tree.proof(member).unwrap();

        let slot = position.index(proof.len());
        proof[slot].0[31] ^= flip;
        prop_assert!(!verify_address(&tree.root(), member, &proof));
    }
}

#[test]
fn three_member_scenario() {
    let addr1 = Address::repeat_byte(0xa1);
    let addr2 = Address::repeat_byte(0xa2);
    let addr3 = Address::repeat_byte(0xa3);
    let addr4 = Address::repeat_byte(0xa4);

    let tree = WhitelistTree::build(&[addr1, addr2, addr3]).unwrap();
    let again = WhitelistTree::build(&[addr1, addr2, addr3]).unwrap();
    assert_eq!(tree.root(), again.root());
    assert_eq!(tree.root().len(), 32);

    let proof = tree.proof(&addr2).unwrap();
    assert_eq!(proof.len(), 2);
    assert!(verify(&tree.root(), &leaf_hash(&addr2), &proof));

    assert_eq!(tree.proof(&addr4), Err(WhitelistError::NotFound(addr4)));
}

#[test]
fn empty_whitelist_is_rejected() {
    assert_eq!(WhitelistTree::build(&[]), Err(WhitelistError::EmptyInput));
}
