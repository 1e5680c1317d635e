// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command handler tests: greeting, history cleanup, deposits, payments.

use confab_agent::commands;
use confab_core::types::{InboundContent, MessageRef, UserCommand};
use confab_core::HistoryAdapter;
use confab_test_utils::TestHarness;

#[tokio::test]
async fn start_greets_by_first_name() {
    let harness = TestHarness::builder().build().await.unwrap();
    let event = harness.text_event("u1", "in-1", "/start");

    commands::handle(&harness.ctx, &event, &UserCommand::Start)
        .await
        .unwrap();

    let sent = harness.transport.sent_messages().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].text, "Hi Test! I'm a bot, please talk to me!");
}

#[tokio::test]
async fn unknown_command_gets_the_not_understood_reply() {
    let harness = TestHarness::builder().build().await.unwrap();
    let event = harness.text_event("u1", "in-1", "/frobnicate");

    commands::handle(
        &harness.ctx,
        &event,
        &UserCommand::Unknown("/frobnicate".to_string()),
    )
    .await
    .unwrap();

    let sent = harness.transport.sent_messages().await;
    assert_eq!(sent[0].text, "Sorry, I didn't understand that command.");
}

#[tokio::test]
async fn delete_last_removes_one_turn_and_both_chat_messages() {
    let harness = TestHarness::builder().build().await.unwrap();

    // Two delivered turns.
    for i in 0..2 {
        let event = harness.text_event("u1", &format!("in-{i}"), "hello");
        harness.processor().process(&event).await.unwrap();
    }
    assert_eq!(harness.history.count("u1").await.unwrap(), 2);

    let event = harness.text_event("u1", "in-cmd", "/delete");
    commands::handle(&harness.ctx, &event, &UserCommand::DeleteLast)
        .await
        .unwrap();

    // One turn gone from the store; the latest exchange's two refs were
    // deleted from the chat.
    assert_eq!(harness.history.count("u1").await.unwrap(), 1);
    let deleted = harness.transport.deleted_refs().await;
    assert_eq!(deleted.len(), 2);
    assert!(deleted.contains(&("u1".to_string(), MessageRef("in-1".to_string()))));
    assert!(deleted.contains(&("u1".to_string(), MessageRef("out-1".to_string()))));
}

#[tokio::test]
async fn repeated_delete_last_is_a_clean_no_op() {
    let harness = TestHarness::builder().build().await.unwrap();

    let event = harness.text_event("u1", "in-1", "hello");
    harness.processor().process(&event).await.unwrap();

    let cmd = harness.text_event("u1", "in-cmd", "/delete");
    commands::handle(&harness.ctx, &cmd, &UserCommand::DeleteLast)
        .await
        .unwrap();
    let deletes_after_first = harness.transport.deleted_refs().await.len();

    // Second /delete: pointers were cleared, so no further chat deletes,
    // and an empty store pops zero rows without erroring.
    commands::handle(&harness.ctx, &cmd, &UserCommand::DeleteLast)
        .await
        .unwrap();
    assert_eq!(
        harness.transport.deleted_refs().await.len(),
        deletes_after_first
    );
    assert_eq!(harness.history.count("u1").await.unwrap(), 0);
}

#[tokio::test]
async fn clear_sweeps_remembered_messages_and_wipes_history() {
    let harness = TestHarness::builder().build().await.unwrap();

    for i in 0..2 {
        let event = harness.text_event("u1", &format!("in-{i}"), "hello");
        harness.processor().process(&event).await.unwrap();
    }

    let cmd = harness.text_event("u1", "in-cmd", "/clear");
    commands::handle(&harness.ctx, &cmd, &UserCommand::Clear)
        .await
        .unwrap();

    // Both exchanges' refs (two inbound, two replies) were swept.
    let deleted = harness.transport.deleted_refs().await;
    assert_eq!(deleted.len(), 4);
    assert_eq!(harness.history.count("u1").await.unwrap(), 0);

    let sent = harness.transport.sent_messages().await;
    assert_eq!(sent.last().unwrap().text, "Conversation cleared.");
}

#[tokio::test]
async fn clear_tolerates_already_deleted_chat_messages() {
    let harness = TestHarness::builder().build().await.unwrap();

    let event = harness.text_event("u1", "in-1", "hello");
    harness.processor().process(&event).await.unwrap();
    // The user removed their own message before /clear.
    harness
        .transport
        .mark_gone(MessageRef("in-1".to_string()))
        .await;

    let cmd = harness.text_event("u1", "in-cmd", "/clear");
    commands::handle(&harness.ctx, &cmd, &UserCommand::Clear)
        .await
        .unwrap();

    assert_eq!(harness.history.count("u1").await.unwrap(), 0);
    let sent = harness.transport.sent_messages().await;
    assert_eq!(sent.last().unwrap().text, "Conversation cleared.");
}

#[tokio::test]
async fn delete_all_wipes_the_store_without_touching_the_chat() {
    let harness = TestHarness::builder().build().await.unwrap();

    for i in 0..3 {
        let event = harness.text_event("u1", &format!("in-{i}"), "hello");
        harness.processor().process(&event).await.unwrap();
    }

    let cmd = harness.text_event("u1", "in-cmd", "/delete_all");
    commands::handle(&harness.ctx, &cmd, &UserCommand::DeleteAll)
        .await
        .unwrap();

    assert_eq!(harness.history.count("u1").await.unwrap(), 0);
    assert!(harness.transport.deleted_refs().await.is_empty());
    let sent = harness.transport.sent_messages().await;
    assert_eq!(sent.last().unwrap().text, "All messages deleted.");
}

#[tokio::test]
async fn deposit_without_provider_token_is_unavailable() {
    let harness = TestHarness::builder().build().await.unwrap();
    let event = harness.text_event("u1", "in-1", "/deposit");

    commands::handle(&harness.ctx, &event, &UserCommand::Deposit)
        .await
        .unwrap();

    let sent = harness.transport.sent_messages().await;
    assert_eq!(sent[0].text, "Deposits are not available right now.");
    assert!(sent[0].menu.is_none());
}

#[tokio::test]
async fn deposit_presents_the_configured_amounts() {
    let harness = TestHarness::builder()
        .with_provider_token("test-provider-token")
        .build()
        .await
        .unwrap();
    let event = harness.text_event("u1", "in-1", "/deposit");

    commands::handle(&harness.ctx, &event, &UserCommand::Deposit)
        .await
        .unwrap();

    let sent = harness.transport.sent_messages().await;
    assert_eq!(sent[0].text, "Choose an amount to deposit:");
    let menu = sent[0].menu.as_ref().unwrap();
    assert_eq!(menu.len(), 4);
    assert_eq!(menu[0].label, "$10");
    assert_eq!(menu[0].amount_minor, 1000);
    assert_eq!(menu[3].amount_minor, 5000);
}

#[tokio::test]
async fn confirmed_payment_credits_and_thanks_with_the_grant() {
    let harness = TestHarness::builder()
        .metered(1)
        .with_units_per_dollar(2)
        .build()
        .await
        .unwrap();

    let mut event = harness.text_event("u1", "in-1", "");
    event.content = InboundContent::PaymentConfirmed {
        amount_minor: 1000,
        currency: "USD".to_string(),
    };

    commands::handle_payment(&harness.ctx, &event, 1000, "USD")
        .await
        .unwrap();

    // $10 at 2 units per dollar.
    assert_eq!(harness.ledger.balance("u1").await.unwrap(), 20);

    let sent = harness.transport.sent_messages().await;
    assert_eq!(
        sent[0].text,
        "Thank you for your payment! You can now use the bot for 20 minutes."
    );
}

#[tokio::test]
async fn payment_unblocks_a_gated_user() {
    let harness = TestHarness::builder().metered(1).build().await.unwrap();

    let event = harness.text_event("u1", "in-1", "hello");
    let outcome = harness.processor().process(&event).await.unwrap();
    assert!(matches!(
        outcome,
        confab_core::types::TurnOutcome::Rejected(_)
    ));

    commands::handle_payment(&harness.ctx, &event, 1000, "USD")
        .await
        .unwrap();

    let event = harness.text_event("u1", "in-2", "hello again");
    let outcome = harness.processor().process(&event).await.unwrap();
    assert!(matches!(
        outcome,
        confab_core::types::TurnOutcome::Delivered { .. }
    ));
    assert_eq!(harness.ledger.balance("u1").await.unwrap(), 9);
}
