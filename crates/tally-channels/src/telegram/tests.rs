//! Tests for the Telegram channel module.

use super::polling::*;
use super::send::main_keyboard;
use super::types::*;
use crate::utils::split_message;
use tally_core::message::AttachmentKind;

#[test]
fn test_split_short_message() {
    let chunks = split_message("hello", 4096);
    assert_eq!(chunks, vec!["hello"]);
}

#[test]
fn test_split_long_message() {
    let text = "a\n".repeat(3000);
    let chunks = split_message(&text, 4096);
    assert!(chunks.len() >= 2);
    for chunk in &chunks {
        assert!(chunk.len() <= 4096);
    }
}

#[test]
fn test_split_respects_char_boundaries() {
    let text = "ж".repeat(3000);
    let chunks = split_message(&text, 4096);
    assert!(chunks.len() >= 2);
    for chunk in &chunks {
        assert!(chunk.len() <= 4096);
        assert!(chunk.chars().all(|c| c == 'ж'));
    }
}

fn parse_message(json: &str) -> TgMessage {
    serde_json::from_str(json).unwrap()
}

#[test]
fn test_event_from_text_message() {
    let msg = parse_message(
        r#"{
            "message_id": 1,
            "from": {"id": 42, "first_name": "Ada", "username": "ada"},
            "chat": {"id": 42, "type": "private"},
            "text": "/add Buy milk"
        }"#,
    );
    let event = event_from_message(msg).unwrap();
    assert_eq!(event.channel, "telegram");
    assert_eq!(event.sender_id, 42);
    assert_eq!(event.reply_target, 42);
    assert_eq!(event.text.as_deref(), Some("/add Buy milk"));
    assert_eq!(event.attachment, AttachmentKind::None);
    assert_eq!(event.sender_name(), "@ada");
}

#[test]
fn test_event_from_document_message() {
    let msg = parse_message(
        r#"{
            "message_id": 2,
            "from": {"id": 42, "first_name": "Ada"},
            "chat": {"id": 42, "type": "private"},
            "document": {"file_id": "abc", "file_name": "notes.pdf"},
            "caption": "my notes"
        }"#,
    );
    let event = event_from_message(msg).unwrap();
    assert_eq!(event.attachment, AttachmentKind::Document);
    assert_eq!(event.text.as_deref(), Some("my notes"));
}

#[test]
fn test_event_from_photo_message_without_caption() {
    let msg = parse_message(
        r#"{
            "message_id": 3,
            "from": {"id": 42, "first_name": "Ada"},
            "chat": {"id": 42, "type": "private"},
            "photo": [
                {"file_id": "small", "width": 90, "height": 90},
                {"file_id": "large", "width": 800, "height": 800}
            ]
        }"#,
    );
    let event = event_from_message(msg).unwrap();
    assert_eq!(event.attachment, AttachmentKind::Photo);
    assert!(event.text.is_none());
}

#[test]
fn test_event_skips_group_chats() {
    let msg = parse_message(
        r#"{
            "message_id": 4,
            "from": {"id": 42, "first_name": "Ada"},
            "chat": {"id": -100123, "type": "group"},
            "text": "/tasks"
        }"#,
    );
    assert!(event_from_message(msg).is_none());
}

#[test]
fn test_event_skips_unsupported_payloads() {
    // A sticker-only message has neither text nor document/photo.
    let msg = parse_message(
        r#"{
            "message_id": 5,
            "from": {"id": 42, "first_name": "Ada"},
            "chat": {"id": 42, "type": "private"}
        }"#,
    );
    assert!(event_from_message(msg).is_none());
}

#[test]
fn test_main_keyboard_has_all_four_buttons() {
    let keyboard = main_keyboard();
    let rendered = keyboard.to_string();
    for label in ["Add", "My tasks", "Complete", "Delete"] {
        assert!(rendered.contains(label), "keyboard should offer {label}");
    }
    assert_eq!(keyboard["one_time_keyboard"], false);
}
