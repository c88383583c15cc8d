//! End-to-end stealth payment scenarios across the core, crypto and stealth crates.

use proptest::prelude::*;
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

use shade_core::constants::CURVE_ORDER;
use shade_core::types::{Announcement, EthAddress, KeyPair, MetaAddress, PrivateKey, RecipientKeys};
use shade_core::ShadeError;
use shade_crypto::{
    ecdh, generate_keypair, generate_keypair_with_rng, generate_private_key_with_rng,
    scalar_add_mod,
};
use shade_stealth::{
    create_stealth_payment, create_stealth_payment_with_rng, scan_announcement, scan_announcements,
    try_recover, ScanResult, ShadeWallet,
};

fn copy_keypair(pair: &KeyPair) -> KeyPair {
    KeyPair::from_secret(PrivateKey::from_bytes(&pair.secret.to_bytes()[..]).unwrap())
}

#[test]
fn end_to_end_payment_is_recovered() {
    let mut rng = ChaCha20Rng::seed_from_u64(2024);
    let recipient = RecipientKeys::new(
        generate_keypair_with_rng(&mut rng),
        generate_keypair_with_rng(&mut rng),
    );

    // Recipient publishes the string form, sender parses it back
    let published = recipient.meta_address().encode();
    let meta: MetaAddress = published.parse().unwrap();
    assert_eq!(meta, recipient.meta_address());

    let payment = create_stealth_payment_with_rng(&meta, &mut rng).unwrap();

    let batch = scan_announcements(std::slice::from_ref(&payment.announcement), &recipient);
    assert_eq!(batch.discoveries.len(), 1);
    assert!(batch.failures.is_empty());

    let keys = &batch.discoveries[0].keys;
    assert_eq!(keys.address, payment.stealth_address);
    assert_eq!(keys.private_key.public_key(), payment.stealth_public_key);
}

#[test]
fn unrelated_recipient_recovers_nothing() {
    let sender_target = ShadeWallet::generate();
    let bystander = RecipientKeys::new(generate_keypair(), generate_keypair());

    let announcements: Vec<Announcement> = (0..50)
        .map(|_| {
            create_stealth_payment(sender_target.meta_address())
                .unwrap()
                .announcement
        })
        .collect();

    let batch = scan_announcements(&announcements, &bystander);
    assert!(batch.discoveries.is_empty());
    // Any tag collision must surface as a mismatch, never as a key pair
    for failure in &batch.failures {
        assert!(failure.error.is_protocol_inconsistency());
    }
}

#[test]
fn forced_tag_collision_is_recovery_mismatch() {
    let a = RecipientKeys::new(generate_keypair(), generate_keypair());
    let b = RecipientKeys::new(generate_keypair(), generate_keypair());

    // Viewing key of A, spending key of B: every tag of A's payments matches
    let mixed = RecipientKeys::new(copy_keypair(&b.spending), copy_keypair(&a.viewing));

    for _ in 0..10 {
        let payment = create_stealth_payment(&a.meta_address()).unwrap();

        let err = try_recover(
            &payment.announcement,
            &mixed.viewing.secret,
            &mixed.spending.secret,
        )
        .unwrap_err();
        match err {
            ShadeError::RecoveryMismatch { expected, derived } => {
                assert_eq!(expected, payment.stealth_address.to_hex());
                assert_ne!(expected, derived);
            }
            other => panic!("expected RecoveryMismatch, got {other:?}"),
        }

        assert!(matches!(
            scan_announcement(&payment.announcement, &mixed),
            ScanResult::Failed(ShadeError::RecoveryMismatch { .. })
        ));
    }
}

#[test]
fn view_tag_false_match_rate() {
    let mut rng = ChaCha20Rng::seed_from_u64(5564);
    let recipient = RecipientKeys::new(
        generate_keypair_with_rng(&mut rng),
        generate_keypair_with_rng(&mut rng),
    );

    const TRIALS: usize = 10_000;
    let mut false_matches = 0;

    for _ in 0..TRIALS {
        let ephemeral = generate_private_key_with_rng(&mut rng).public_key();
        let tag = (rng.next_u32() & 0xff) as u8;

        let announcement = Announcement::new(
            1,
            EthAddress::from_array([0x11; 20]),
            EthAddress::zero(),
            ephemeral.to_bytes().to_vec(),
            vec![tag],
        );

        match try_recover(
            &announcement,
            &recipient.viewing.secret,
            &recipient.spending.secret,
        ) {
            Ok(None) => {}
            Err(ShadeError::RecoveryMismatch { .. }) => false_matches += 1,
            other => panic!("unexpected scan outcome: {other:?}"),
        }
    }

    // Expected TRIALS / 256 ≈ 39
    assert!(
        (10..=80).contains(&false_matches),
        "false matches out of range: {false_matches}"
    );
}

#[test]
fn own_announcements_always_match() {
    let wallet = ShadeWallet::generate();
    for _ in 0..100 {
        let payment = create_stealth_payment(wallet.meta_address()).unwrap();
        assert!(wallet.try_discover(&payment.announcement).unwrap().is_some());
    }
}

#[test]
fn scalar_boundary() {
    let mut n_minus_one = CURVE_ORDER;
    n_minus_one[31] -= 1;
    let mut two = [0u8; 32];
    two[31] = 2;
    let mut one = [0u8; 32];
    one[31] = 1;

    assert_eq!(scalar_add_mod(&n_minus_one, &two), one);
    assert_eq!(scalar_add_mod(&n_minus_one, &one), [0u8; 32]);
}

#[cfg(feature = "parallel")]
#[test]
fn parallel_scan_matches_sequential() {
    let wallet = ShadeWallet::generate();
    let other = ShadeWallet::generate();

    let announcements: Vec<Announcement> = (0..64)
        .map(|i| {
            let target = if i % 5 == 0 { &wallet } else { &other };
            create_stealth_payment(target.meta_address()).unwrap().announcement
        })
        .collect();

    let sequential = scan_announcements(&announcements, wallet.keys());
    let parallel = shade_stealth::scan_announcements_parallel(&announcements, wallet.keys());

    let seq: Vec<_> = sequential.discoveries.iter().map(|d| (d.index, d.keys.address)).collect();
    let par: Vec<_> = parallel.discoveries.iter().map(|d| (d.index, d.keys.address)).collect();
    assert_eq!(seq, par);
    assert_eq!(seq.len(), 13);
    assert_eq!(sequential.stats.total_scanned, parallel.stats.total_scanned);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn ecdh_commutes(seed_a in any::<u64>(), seed_b in any::<u64>()) {
        let a = generate_keypair_with_rng(&mut ChaCha20Rng::seed_from_u64(seed_a));
        let b = generate_keypair_with_rng(&mut ChaCha20Rng::seed_from_u64(seed_b));

        prop_assert_eq!(
            ecdh(&a.secret, &b.public).unwrap(),
            ecdh(&b.secret, &a.public).unwrap()
        );
    }

    #[test]
    fn seeded_payment_round_trip(seed in any::<u64>()) {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let wallet = ShadeWallet::generate_with_rng(&mut rng);
        let payment = create_stealth_payment_with_rng(wallet.meta_address(), &mut rng).unwrap();

        let keys = wallet.try_discover(&payment.announcement).unwrap().unwrap();
        prop_assert_eq!(keys.address, payment.stealth_address);
        prop_assert_eq!(keys.private_key.public_key(), payment.stealth_public_key);
    }
}
