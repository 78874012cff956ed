//! Git origin behavior against real repositories.

mod common;

use std::ops::ControlFlow;

use caravan::origin::{GitOrigin, GitRepoType, Origin};
use caravan::revision::Revision;

use common::TestRepo;

fn origin_for(repo: &TestRepo, storage: &tempfile::TempDir) -> Origin {
    Origin::Git(GitOrigin::new(
        repo.url(),
        Some("main".to_string()),
        GitRepoType::Plain,
        storage.path(),
    ))
}

#[test]
fn resolves_symbolic_ref_to_commit_id() {
    let repo = TestRepo::new();
    repo.write_file("a.txt", "a");
    let sha = repo.commit("initial");

    let storage = tempfile::tempdir().unwrap();
    let origin = origin_for(&repo, &storage);

    let rev = origin.resolve(Some("main")).unwrap();
    assert_eq!(rev.as_str(), sha);

    // No explicit reference falls back to the configured default ref
    let rev = origin.resolve(None).unwrap();
    assert_eq!(rev.as_str(), sha);
}

#[test]
fn resolves_full_sha_reachable_from_heads() {
    let repo = TestRepo::new();
    repo.write_file("a.txt", "a");
    let older = repo.commit("first");
    repo.write_file("b.txt", "b");
    repo.commit("second");

    let storage = tempfile::tempdir().unwrap();
    let origin = origin_for(&repo, &storage);

    // An ancestor sha resolves even though no ref points at it: the
    // default refspec fetch brings the whole history over.
    let rev = origin.resolve(Some(older.as_str())).unwrap();
    assert_eq!(rev.as_str(), older);
}

#[test]
fn unreachable_sha_is_a_vcs_error() {
    let repo = TestRepo::new();
    repo.write_file("a.txt", "a");
    repo.commit("only");

    let storage = tempfile::tempdir().unwrap();
    let origin = origin_for(&repo, &storage);

    let missing = "0123456789abcdef0123456789abcdef01234567";
    let err = origin.resolve(Some(missing)).unwrap_err();
    assert!(matches!(err, caravan::MigrateError::Vcs(_)));
}

#[test]
fn changes_are_oldest_first_with_first_parent_chain() {
    let repo = TestRepo::new();
    repo.write_file("a.txt", "a");
    let first = repo.commit("first change\n\nBUG=100");
    repo.write_file("b.txt", "b");
    let second = repo.commit("second change");
    repo.write_file("c.txt", "c");
    let third = repo.commit("third change\n\nBUG: 300");

    let storage = tempfile::tempdir().unwrap();
    let origin = origin_for(&repo, &storage);
    let to = origin.resolve(Some("main")).unwrap();

    let changes = origin.changes(None, &to).unwrap();
    assert_eq!(changes.len(), 3);
    assert_eq!(changes[0].revision.as_str(), first);
    assert_eq!(changes[2].revision.as_str(), third);
    // Dates never decrease along the chain
    assert!(changes.windows(2).all(|w| w[0].date <= w[1].date));
    // The first element's parent is the range start when one is given
    let range = origin
        .changes(Some(&Revision::new(first.clone())), &to)
        .unwrap();
    assert_eq!(range.len(), 2);
    assert_eq!(range[0].revision.as_str(), second);
    assert_eq!(range[0].first_parent().unwrap().as_str(), first);
    // Labels ride along, in both `=` and `: ` forms
    assert_eq!(
        changes[0].labels.get("BUG").map(String::as_str),
        Some("100")
    );
    assert_eq!(
        changes[2].labels.get("BUG").map(String::as_str),
        Some("300")
    );
}

#[test]
fn merge_commits_are_not_traversed() {
    let repo = TestRepo::new();
    repo.write_file("a.txt", "a");
    let base = repo.commit("base");

    repo.git(&["checkout", "-q", "-b", "feature"]);
    repo.write_file("feature.txt", "f");
    let feature = repo.commit("feature work");

    repo.git(&["checkout", "-q", "main"]);
    repo.write_file("main.txt", "m");
    repo.commit("mainline work");
    repo.git(&["merge", "-q", "--no-ff", "--no-edit", "feature"]);

    let storage = tempfile::tempdir().unwrap();
    let origin = origin_for(&repo, &storage);
    let to = origin.resolve(Some("main")).unwrap();

    let changes = origin.changes(None, &to).unwrap();
    let shas: Vec<&str> = changes.iter().map(|c| c.revision.as_str()).collect();
    assert!(!shas.contains(&feature.as_str()), "merge side not walked");
    assert!(shas.contains(&base.as_str()));
    // The merge commit itself carries both parents
    let merge = changes.last().unwrap();
    assert_eq!(merge.parents.len(), 2);
}

#[test]
fn checkout_materializes_exact_tree() {
    let repo = TestRepo::new();
    repo.write_file("kept.txt", "kept");
    repo.write_file("dir/nested.txt", "nested");
    repo.commit("tree");

    let storage = tempfile::tempdir().unwrap();
    let origin = origin_for(&repo, &storage);
    let rev = origin.resolve(Some("main")).unwrap();

    let workdir = tempfile::tempdir().unwrap();
    std::fs::write(workdir.path().join("stale.txt"), "stale").unwrap();
    origin.checkout(&rev, workdir.path()).unwrap();

    assert_eq!(
        common::list_tree(workdir.path()),
        vec!["dir/nested.txt", "kept.txt"]
    );
    assert_eq!(
        std::fs::read_to_string(workdir.path().join("kept.txt")).unwrap(),
        "kept"
    );
}

#[test]
fn single_change_lookup() {
    let repo = TestRepo::new();
    repo.write_file("a.txt", "a");
    repo.commit("first");
    repo.write_file("b.txt", "b");
    let second = repo.commit("second");

    let storage = tempfile::tempdir().unwrap();
    let origin = origin_for(&repo, &storage);
    origin.resolve(Some("main")).unwrap();

    let change = origin.change(&Revision::new(second.clone())).unwrap();
    assert_eq!(change.revision.as_str(), second);
    assert_eq!(change.message, "second");
}

#[test]
fn visit_changes_walks_toward_root_and_honors_break() {
    let repo = TestRepo::new();
    for i in 0..5 {
        repo.write_file("counter.txt", &i.to_string());
        repo.commit(&format!("change {i}"));
    }

    let storage = tempfile::tempdir().unwrap();
    let origin = origin_for(&repo, &storage);
    let head = origin.resolve(Some("main")).unwrap();

    let mut seen = Vec::new();
    origin
        .visit_changes(&head, |change| {
            seen.push(change.first_line().to_string());
            ControlFlow::Continue(())
        })
        .unwrap();
    assert_eq!(
        seen,
        vec!["change 4", "change 3", "change 2", "change 1", "change 0"]
    );

    let mut visited = 0;
    origin
        .visit_changes(&head, |_| {
            visited += 1;
            if visited == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .unwrap();
    assert_eq!(visited, 2);
}

#[test]
fn label_name_identifies_origin_kind() {
    let repo = TestRepo::new();
    let storage = tempfile::tempdir().unwrap();
    assert_eq!(origin_for(&repo, &storage).label_name(), "GitOrigin-RevId");
}
