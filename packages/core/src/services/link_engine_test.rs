//! Tests for LinkEngine
//!
//! Tests cover:
//! - Session handling and owner scoping
//! - Confirming existing and new-note references
//! - Importing references from pasted content
//! - Backlinks, outgoing links and graph queries
//! - Pruning, dangling-edge sweeps and explicit rename propagation

#[cfg(test)]
mod tests {
    use crate::config::EngineConfig;
    use crate::db::{InMemoryStore, LinkStore, NoteStore};
    use crate::models::{EdgeSpec, Note, ValidationError};
    use crate::services::{LinkEngine, LinkError, Selection, StaticSession};
    use anyhow::Result;
    use std::sync::Arc;

    const OWNER: &str = "owner-1";

    struct TestEnv {
        store: Arc<InMemoryStore>,
        engine: LinkEngine,
    }

    fn create_test_env() -> TestEnv {
        let store = Arc::new(InMemoryStore::new());
        let engine = LinkEngine::new(
            store.clone(),
            store.clone(),
            Arc::new(StaticSession::new(OWNER)),
            EngineConfig::default(),
        );
        TestEnv { store, engine }
    }

    async fn note(env: &TestEnv, title: &str) -> Result<Note> {
        let slug = crate::utils::slugify(title);
        Ok(env.store.create_note(OWNER, title, &slug, "").await?)
    }

    // =========================================================================
    // Session
    // =========================================================================

    #[tokio::test]
    async fn test_calls_without_owner_are_unauthenticated() {
        let store = Arc::new(InMemoryStore::new());
        let engine = LinkEngine::new(
            store.clone(),
            store,
            Arc::new(StaticSession::anonymous()),
            EngineConfig::default(),
        );

        assert_eq!(engine.resolve("x", None).await, Err(LinkError::Unauthenticated));
        assert_eq!(
            engine.get_backlinks("n").await.unwrap_err(),
            LinkError::Unauthenticated
        );
        assert!(matches!(
            engine.resolver_session(None),
            Err(LinkError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_other_owner_graph_is_not_found() -> Result<()> {
        let env = create_test_env();
        let err = env.engine.get_graph_summary("someone-else").await.unwrap_err();
        assert!(err.is_not_found());
        let err = env
            .engine
            .get_visual_subgraph("someone-else", None)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        Ok(())
    }

    #[tokio::test]
    async fn test_other_owner_note_is_not_found() -> Result<()> {
        let env = create_test_env();
        let foreign = env
            .store
            .create_note("someone-else", "Secret", "secret", "")
            .await?;

        assert!(env.engine.get_backlinks(&foreign.id).await.unwrap_err().is_not_found());
        assert!(env
            .engine
            .get_outgoing_links(&foreign.id)
            .await
            .unwrap_err()
            .is_not_found());
        Ok(())
    }

    // =========================================================================
    // Confirming references
    // =========================================================================

    #[tokio::test]
    async fn test_confirm_existing_reference() -> Result<()> {
        let env = create_test_env();
        let source = note(&env, "Daily Log").await?;
        let target = note(&env, "Project Alpha").await?;

        let candidates = env.engine.resolve("proj", Some(&source.id)).await?;
        let chosen = candidates.existing[0].clone();
        let edge = env
            .engine
            .confirm_reference(&source.id, "proj", Selection::Existing { note: chosen })
            .await?;

        assert_eq!(edge.target_note_id, target.id);
        assert_eq!(edge.anchor_text.as_deref(), Some("proj"));
        assert_eq!(edge.canonical_title, "Project Alpha");
        assert_eq!(edge.canonical_slug, "project-alpha");

        let view = env.engine.view().await?;
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].edge.id, edge.id);
        assert!(!view[0].is_optimistic);
        Ok(())
    }

    #[tokio::test]
    async fn test_confirm_create_new_reference() -> Result<()> {
        let env = create_test_env();
        let source = note(&env, "Daily Log").await?;
        note(&env, "Roadmap").await?;

        let edge = env
            .engine
            .confirm_reference(
                &source.id,
                "  Roadmap ",
                Selection::CreateNew {
                    title: "  Roadmap ".to_string(),
                },
            )
            .await?;

        let created = env
            .store
            .get_note(OWNER, &edge.target_note_id)
            .await?
            .expect("new note should exist");
        assert_eq!(created.title, "Roadmap");
        assert_eq!(created.slug, "roadmap-2");
        assert_eq!(created.content, "");
        assert_eq!(edge.canonical_slug, "roadmap-2");
        assert_eq!(edge.anchor_text.as_deref(), Some("Roadmap"));
        Ok(())
    }

    #[tokio::test]
    async fn test_confirm_self_reference_is_rejected() -> Result<()> {
        let env = create_test_env();
        let source = note(&env, "Loop").await?;

        let err = env
            .engine
            .confirm_reference(
                &source.id,
                "Loop",
                Selection::Existing {
                    note: source.summary(),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LinkError::Validation(ValidationError::SelfLoop { .. })
        ));
        assert!(env.engine.view().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_confirm_from_missing_source_creates_nothing() -> Result<()> {
        let env = create_test_env();

        let err = env
            .engine
            .confirm_reference(
                "ghost",
                "New",
                Selection::CreateNew {
                    title: "New".to_string(),
                },
            )
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert!(env.store.list_notes(OWNER).await?.is_empty());
        Ok(())
    }

    // =========================================================================
    // Import
    // =========================================================================

    #[tokio::test]
    async fn test_import_references_links_known_titles() -> Result<()> {
        let env = create_test_env();
        let source = note(&env, "Meeting").await?;
        let alpha = note(&env, "Alpha").await?;
        let beta = note(&env, "Beta").await?;

        let outcome = env
            .engine
            .import_references(
                &source.id,
                "Discussed [[alpha]], [[Unknown Thing]] and [[Beta|the beta]].",
            )
            .await?;

        assert_eq!(outcome.committed.len(), 2);
        assert_eq!(outcome.committed[0].target_note_id, alpha.id);
        assert_eq!(outcome.committed[0].anchor_text.as_deref(), Some("alpha"));
        assert_eq!(outcome.committed[1].target_note_id, beta.id);
        assert_eq!(outcome.committed[1].anchor_text.as_deref(), Some("the beta"));

        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].index, 1);
        assert_eq!(
            outcome.failures[0].error,
            LinkError::note_not_found("Unknown Thing")
        );
        assert_eq!(env.engine.view().await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_import_maps_coordinator_failures_to_content_positions() -> Result<()> {
        let env = create_test_env();
        let source = note(&env, "Journal").await?;
        note(&env, "Alpha").await?;

        let outcome = env
            .engine
            .import_references(&source.id, "[[Missing]] [[Alpha]] [[Journal]]")
            .await?;

        assert_eq!(outcome.committed.len(), 1);
        let failed: Vec<usize> = outcome.failures.iter().map(|f| f.index).collect();
        assert_eq!(failed, vec![0, 2]);
        assert!(matches!(
            outcome.failures[1].error,
            LinkError::Validation(ValidationError::SelfLoop { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_import_without_references_is_empty() -> Result<()> {
        let env = create_test_env();
        let source = note(&env, "Plain").await?;
        let outcome = env.engine.import_references(&source.id, "no links here").await?;
        assert!(outcome.is_complete());
        assert!(outcome.committed.is_empty());
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    #[tokio::test]
    async fn test_backlinks_include_source_summary() -> Result<()> {
        let env = create_test_env();
        let a = note(&env, "A").await?;
        let b = note(&env, "B").await?;
        let hub = note(&env, "Hub").await?;
        for source in [&a, &b] {
            env.engine
                .confirm_reference(
                    &source.id,
                    "Hub",
                    Selection::Existing {
                        note: hub.summary(),
                    },
                )
                .await?;
        }

        let backlinks = env.engine.get_backlinks(&hub.id).await?;
        let sources: Vec<_> = backlinks.iter().map(|b| b.source.title.as_str()).collect();
        assert_eq!(sources, vec!["A", "B"]);
        assert!(backlinks.iter().all(|b| b.edge.target_note_id == hub.id));

        let outgoing = env.engine.get_outgoing_links(&a.id).await?;
        assert_eq!(outgoing.len(), 1);
        assert!(env.engine.get_outgoing_links(&hub.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_graph_summary_and_visual_subgraph() -> Result<()> {
        let env = create_test_env();
        let a = note(&env, "A").await?;
        let b = note(&env, "B").await?;
        let lonely = note(&env, "Lonely").await?;
        env.store
            .create_edge(OWNER, EdgeSpec::new(&a.id, &b.id, "B", "b"))
            .await?;

        let summary = env.engine.get_graph_summary(OWNER).await?;
        assert_eq!(summary.most_connected.len(), 2);
        assert_eq!(summary.orphans.len(), 1);
        assert_eq!(summary.orphans[0].id, lonely.id);

        let visual = env.engine.get_visual_subgraph(OWNER, Some(2)).await?;
        assert_eq!(visual.nodes.len(), 2);
        assert_eq!(visual.edges.len(), 1);
        assert!(visual.nodes.iter().all(|n| n.size == 8.0));

        let visual = env.engine.get_visual_subgraph(OWNER, None).await?;
        assert_eq!(visual.nodes.len(), 3);
        Ok(())
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    #[tokio::test]
    async fn test_prune_note_removes_both_directions() -> Result<()> {
        let env = create_test_env();
        let a = note(&env, "A").await?;
        let b = note(&env, "B").await?;
        let c = note(&env, "C").await?;
        env.store.create_edge(OWNER, EdgeSpec::new(&a.id, &b.id, "B", "b")).await?;
        env.store.create_edge(OWNER, EdgeSpec::new(&b.id, &c.id, "C", "c")).await?;
        env.store.create_edge(OWNER, EdgeSpec::new(&a.id, &c.id, "C", "c")).await?;
        env.engine.load_view().await?;

        env.store.delete_note(OWNER, &b.id).await?;
        let removed = env.engine.prune_note(&b.id).await?;

        assert_eq!(removed, 2);
        let remaining = env.store.list_edges_for_owner(OWNER).await?;
        assert_eq!(remaining.len(), 1);
        assert_eq!(env.engine.view().await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_prune_dangling_sweeps_unannounced_deletions() -> Result<()> {
        let env = create_test_env();
        let a = note(&env, "A").await?;
        let b = note(&env, "B").await?;
        let c = note(&env, "C").await?;
        let d = note(&env, "D").await?;
        env.store.create_edge(OWNER, EdgeSpec::new(&a.id, &b.id, "B", "b")).await?;
        env.store.create_edge(OWNER, EdgeSpec::new(&c.id, &a.id, "A", "a")).await?;
        env.store.create_edge(OWNER, EdgeSpec::new(&d.id, &c.id, "C", "c")).await?;
        env.store.create_edge(OWNER, EdgeSpec::new(&a.id, &d.id, "D", "d")).await?;
        env.engine.load_view().await?;

        // No pruner is listening, so both deletions go unhandled
        env.store.delete_note(OWNER, &b.id).await?;
        env.store.delete_note(OWNER, &c.id).await?;

        let removed = env.engine.prune_dangling().await?;

        assert_eq!(removed, 3);
        let remaining = env.store.list_edges_for_owner(OWNER).await?;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].source_note_id, a.id);
        assert_eq!(remaining[0].target_note_id, d.id);
        let view = env.engine.view().await?;
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].edge.id, remaining[0].id);

        assert_eq!(env.engine.prune_dangling().await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_rename_is_snapshot_until_propagated() -> Result<()> {
        let env = create_test_env();
        let source = note(&env, "Source").await?;
        let target = note(&env, "Old Name").await?;
        let edge = env
            .engine
            .confirm_reference(
                &source.id,
                "Old Name",
                Selection::Existing {
                    note: target.summary(),
                },
            )
            .await?;

        env.store
            .rename_note(OWNER, &target.id, "New Name", "new-name")
            .await?;
        let before = env.engine.get_outgoing_links(&source.id).await?;
        assert_eq!(before[0].canonical_title, "Old Name");

        assert_eq!(env.engine.propagate_rename(&target.id).await?, 1);

        let after = env.engine.get_outgoing_links(&source.id).await?;
        assert_eq!(after[0].id, edge.id);
        assert_eq!(after[0].canonical_title, "New Name");
        assert_eq!(after[0].canonical_slug, "new-name");
        assert_eq!(after[0].anchor_text.as_deref(), Some("Old Name"));
        assert_eq!(env.engine.view().await?[0].edge.canonical_title, "New Name");
        Ok(())
    }
}
