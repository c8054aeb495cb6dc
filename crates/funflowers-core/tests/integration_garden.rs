//! Integration test: growing flowers
//!
//! Spend seeds until the balance runs out, buy more, keep growing.

mod common;

use common::{Harness, UiEvent, flow_success, seeds_purchase};
use funflowers_core::PurchaseOutcome;
use funflowers_types::GrowOutcome;

const OUT_OF_SEEDS: &str =
    "Oh no! You have run out of seeds! Buy some more so you can keep growing flowers!";

#[tokio::test]
async fn grow_spends_one_seed_and_picks_parts_in_range() {
    let h = Harness::connected().await;
    h.presenter.clear();

    let outcome = h.controller.grow_flower();

    let GrowOutcome::Grown { flower, balance } = outcome else {
        panic!("expected a flower, got {outcome:?}");
    };
    assert_eq!(balance, 19);
    assert!(flower.top < 10);
    assert!(flower.bottom < 6);
    assert_eq!(h.stored_balance(), Some(19));
    assert_eq!(h.controller.snapshot().last_flower, Some(flower));
    assert_eq!(
        h.presenter.events(),
        vec![
            UiEvent::Flower(flower.top, flower.bottom),
            UiEvent::Balance(19),
        ]
    );
}

#[test]
fn grow_does_not_need_billing_connection() {
    let h = Harness::new();
    assert!(h.controller.grow_flower().flower().is_some());
}

#[tokio::test]
async fn twenty_grows_then_out_of_seeds_then_buy() {
    let h = Harness::connected().await;

    for expected in (0..20).rev() {
        match h.controller.grow_flower() {
            GrowOutcome::Grown { balance, .. } => assert_eq!(balance, expected),
            GrowOutcome::NoSeedsAvailable => panic!("ran out early at {expected}"),
        }
    }
    assert_eq!(h.controller.balance(), 0);
    let last_flower = h.controller.snapshot().last_flower;

    // Empty: nothing changes, the player is told to buy more.
    h.presenter.clear();
    assert_eq!(h.controller.grow_flower(), GrowOutcome::NoSeedsAvailable);
    assert_eq!(h.controller.balance(), 0);
    assert_eq!(h.stored_balance(), Some(0));
    assert_eq!(h.controller.snapshot().last_flower, last_flower);
    assert_eq!(h.presenter.events(), vec![UiEvent::Error(OUT_OF_SEEDS.into())]);

    h.gateway.script_flow(flow_success(&seeds_purchase("tok-refill")));
    let outcome = h.controller.buy_seeds().await.unwrap();
    assert!(matches!(
        outcome,
        PurchaseOutcome::Consumed {
            awarded: true,
            balance: 20,
            ..
        }
    ));

    assert!(matches!(
        h.controller.grow_flower(),
        GrowOutcome::Grown { balance: 19, .. }
    ));
}

#[test]
fn fresh_player_starts_with_twenty_seeds() {
    let h = Harness::new();
    let snapshot = h.controller.snapshot();
    assert_eq!(snapshot.balance, 20);
    assert_eq!(snapshot.last_flower, None);
    assert_eq!(h.stored_balance(), None);
}
