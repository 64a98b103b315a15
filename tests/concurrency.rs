use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;
use stickynotes::error::NoteError;
use stickynotes::model::{MetaPatch, NoteFormat, SortKey};
use stickynotes::test_utils::TestEnv;

#[test]
fn test_pin_and_save_race_keeps_both_bumps() {
    for _ in 0..10 {
        let env = TestEnv::new();
        let setup = env.sibling();
        let note = setup.create_note(NoteFormat::Markdown, Some("Shared")).unwrap();
        let start = setup.save_content(&note.meta.id, "base", None).unwrap().rev;

        let barrier = Arc::new(Barrier::new(2));
        let pinner = {
            let api = env.sibling();
            let id = note.meta.id.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                api.update_meta(
                    &id,
                    &MetaPatch {
                        pinned: Some(true),
                        ..MetaPatch::default()
                    },
                )
                .unwrap();
            })
        };
        let saver = {
            let api = env.sibling();
            let id = note.meta.id.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                api.save_content(&id, "edited", None).unwrap();
            })
        };
        pinner.join().unwrap();
        saver.join().unwrap();

        let got = setup.get_note(&note.meta.id).unwrap();
        assert_eq!(got.meta.rev, start + 2);
        assert!(got.meta.pinned);
        assert_eq!(got.content, "edited");

        let indexed = setup.list_notes(false, SortKey::Updated, None).unwrap();
        assert_eq!(indexed.len(), 1);
        assert_eq!(indexed[0].rev, start + 2);
        assert!(indexed[0].pinned);
    }
}

#[test]
fn test_parallel_creates_lose_no_index_entries() {
    let env = TestEnv::new();
    let workers = 8;
    let per_worker = 10;

    let handles: Vec<_> = (0..workers)
        .map(|w| {
            let api = env.sibling();
            thread::spawn(move || {
                (0..per_worker)
                    .map(|i| {
                        api.create_note(NoteFormat::Text, Some(&format!("w{} n{}", w, i)))
                            .unwrap()
                            .meta
                            .id
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        for id in handle.join().unwrap() {
            assert!(ids.insert(id));
        }
    }

    let api = env.sibling();
    let listed = api.list_notes(false, SortKey::Created, None).unwrap();
    assert_eq!(listed.len(), workers * per_worker);
    let listed_ids: HashSet<_> = listed.into_iter().map(|m| m.id).collect();
    assert_eq!(listed_ids, ids);
}

#[test]
fn test_shared_instance_across_threads() {
    let env = TestEnv::new();
    let api = Arc::new(env.sibling());
    let note = api.create_note(NoteFormat::Markdown, None).unwrap();

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let api = Arc::clone(&api);
            let id = note.meta.id.clone();
            thread::spawn(move || {
                api.save_content(&id, &format!("writer {}", i), None).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let got = api.get_note(&note.meta.id).unwrap();
    assert_eq!(got.meta.rev, 7);
    assert!(got.content.starts_with("writer "));
}

#[test]
fn test_disable_racing_encrypt_leaves_note_readable() {
    for _ in 0..10 {
        let env = TestEnv::with_passphrase(Some("pw"));
        let setup = env.sibling();
        let note = setup.create_note(NoteFormat::Markdown, None).unwrap();
        setup.save_content(&note.meta.id, "note plaintext", None).unwrap();

        let barrier = Arc::new(Barrier::new(2));
        let encrypter = {
            let api = env.sibling();
            let id = note.meta.id.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                api.toggle_note_encryption(&id, true)
            })
        };
        let disabler = {
            let api = env.sibling();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                api.disable_encryption("pw").unwrap()
            })
        };
        let toggled = encrypter.join().unwrap();
        let report = disabler.join().unwrap();
        assert_eq!(report.errors, 0);

        match toggled {
            Ok(_) => assert_eq!(report.decrypted, 1),
            Err(e) => assert!(matches!(e, NoteError::NoKeyConfigured)),
        }
        let got = setup.get_note(&note.meta.id).unwrap();
        assert!(!got.meta.encrypted);
        assert_eq!(got.content, "note plaintext");
        assert!(!setup.encryption_status().unwrap().has_key);
    }
}
