// Pane actions driven through QuerySession

mod common;

use std::sync::Arc;

use common::*;
use dataselector_configs::DataSelectorConfig;
use dataselector_core::{
    OutputFormat, ProcessingState, QueryEdit, QuerySession, RunStatus, Severity, TableCatalog,
    VerifyOutcome,
};

fn session_with(
    harness: &Harness,
    config: DataSelectorConfig,
    probe: Arc<RecordingProbe>,
) -> QuerySession {
    QuerySession::new(Arc::new(config), harness.services(), probe).with_user_name(USER)
}

fn species_db() -> FakeDb {
    FakeDb::with_tables(&[
        "dbo.Species",
        "dbo.Sites",
        "gis.Boundaries",
        "dbo.Species_point_bob",
    ])
    .columns("dbo.Species", &["TaxonName", "Shape"])
}

#[tokio::test]
async fn test_refresh_filters_and_sorts_tables() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.database.exclude_wildcard = "{schema}.*_point_*".into();
    let harness = Harness::new(species_db(), FakeMaps::default(), ScriptedPrompter::default());
    let mut session = session_with(&harness, config, Arc::default());

    assert_eq!(*session.catalog(), TableCatalog::NotLoaded);
    session.refresh_tables().await.unwrap();

    assert_eq!(session.catalog().tables(), ["Sites", "Species"]);
    assert_eq!(session.processing(), ProcessingState::Idle);
}

#[tokio::test]
async fn test_enablement_follows_edits() {
    let dir = TempDir::new().unwrap();
    let harness = Harness::new(species_db(), FakeMaps::default(), ScriptedPrompter::default());
    let mut session = session_with(&harness, test_config(dir.path()), Arc::default());

    let flags = session.enablement();
    assert!(!flags.clear && !flags.save && !flags.verify && !flags.run);
    assert!(flags.load && flags.refresh);

    session.edit(QueryEdit::Columns("*".into()));
    let flags = session.edit(QueryEdit::Where("from foo".into()));
    assert!(flags.save && flags.clear);
    // Verify needs the table list loaded
    assert!(!flags.verify);

    session.refresh_tables().await.unwrap();
    assert!(session.enablement().verify);
    assert!(!session.enablement().run);

    let flags = session.edit(QueryEdit::Where("foo = 1".into()));
    assert!(!flags.verify);

    session.edit(QueryEdit::Table(Some("Species".into())));
    let flags = session.edit(QueryEdit::OutputFormat(Some(OutputFormat::Csv)));
    assert!(flags.verify && flags.run);
}

#[tokio::test]
async fn test_clear_keeps_output_format() {
    let dir = TempDir::new().unwrap();
    let harness = Harness::new(species_db(), FakeMaps::default(), ScriptedPrompter::default());
    let mut session = session_with(&harness, test_config(dir.path()), Arc::default());

    session.edit(QueryEdit::Columns("TaxonName".into()));
    session.edit(QueryEdit::Table(Some("Species".into())));
    session.edit(QueryEdit::OutputFormat(Some(OutputFormat::Shapefile)));
    let flags = session.clear();

    assert!(session.state().columns.is_empty());
    assert!(session.state().selected_table.is_none());
    assert_eq!(
        session.state().selected_output_format,
        Some(OutputFormat::Shapefile)
    );
    assert!(!flags.clear);
}

#[tokio::test]
async fn test_default_format_from_config() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.output.default_format = Some("csv".into());
    let harness = Harness::new(species_db(), FakeMaps::default(), ScriptedPrompter::default());
    let session = session_with(&harness, config, Arc::default());

    assert_eq!(session.state().selected_output_format, Some(OutputFormat::Csv));
}

#[tokio::test]
async fn test_verify_reports_valid_and_invalid_sql() {
    let dir = TempDir::new().unwrap();
    let harness = Harness::new(species_db(), FakeMaps::default(), ScriptedPrompter::default());
    let probe = Arc::new(RecordingProbe::default());
    let mut session = session_with(&harness, test_config(dir.path()), probe.clone());

    session.refresh_tables().await.unwrap();
    session.edit(QueryEdit::Columns("TaxonName".into()));
    session.edit(QueryEdit::Table(Some("Species".into())));

    let outcome = session.verify().await.unwrap();
    assert_eq!(outcome, VerifyOutcome::Valid);
    assert_eq!(session.message().unwrap().severity, Severity::Success);
    assert_eq!(
        probe.statements.lock()[0],
        "SET NOEXEC ON;\nSELECT TaxonName FROM dbo.Species;\nSET NOEXEC OFF;"
    );

    let rejecting = Arc::new(RecordingProbe {
        reject_with: Some("Invalid column name 'Taxon'. SET NOEXEC OFF;".into()),
        ..Default::default()
    });
    let mut session = session_with(&harness, test_config(dir.path()), rejecting);
    session.refresh_tables().await.unwrap();
    session.edit(QueryEdit::Columns("Taxon".into()));
    session.edit(QueryEdit::Table(Some("Species".into())));

    let outcome = session.verify().await.unwrap();
    assert_eq!(
        outcome,
        VerifyOutcome::Invalid("Invalid column name 'Taxon'.".into())
    );
    let message = session.message().unwrap();
    assert_eq!(message.severity, Severity::Warning);
    assert!(message.text.contains("Invalid column name 'Taxon'."));
}

#[tokio::test]
async fn test_verify_refused_without_source() {
    let dir = TempDir::new().unwrap();
    let harness = Harness::new(species_db(), FakeMaps::default(), ScriptedPrompter::default());
    let probe = Arc::new(RecordingProbe::default());
    let mut session = session_with(&harness, test_config(dir.path()), probe.clone());

    session.refresh_tables().await.unwrap();
    session.edit(QueryEdit::Columns("*".into()));

    assert!(session.verify().await.is_err());
    assert!(probe.statements.lock().is_empty());
}

#[tokio::test]
async fn test_save_appends_extension() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("myquery");
    let harness = Harness::new(
        species_db(),
        FakeMaps::default(),
        ScriptedPrompter::answering_paths(&[target.to_str().unwrap()]),
    );
    let mut session = session_with(&harness, test_config(dir.path()), Arc::default());
    session.edit(QueryEdit::Columns("TaxonName,\nShape".into()));
    session.edit(QueryEdit::Table(Some("Species".into())));

    let saved = session.save_query().await.unwrap().unwrap();

    assert_eq!(saved, dir.path().join("myquery.qsf"));
    assert_eq!(session.state().saved_query_name.as_deref(), Some("myquery"));
    let text = std::fs::read_to_string(&saved).unwrap();
    assert!(text.starts_with("FIELDS {TaxonName,$$Shape}\nFROM {Species}\n"));

    let request = harness.prompter.requests.lock()[0].clone();
    assert!(request.for_save);
    assert_eq!(request.filter.extension.as_deref(), Some("qsf"));
}

#[tokio::test]
async fn test_save_rejects_wrong_extension() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("myquery.bad");
    let harness = Harness::new(
        species_db(),
        FakeMaps::default(),
        ScriptedPrompter::answering_paths(&[target.to_str().unwrap()]),
    );
    let mut session = session_with(&harness, test_config(dir.path()), Arc::default());
    session.edit(QueryEdit::Columns("TaxonName".into()));

    assert_eq!(session.save_query().await.unwrap(), None);
    assert!(!target.exists());
    let message = session.message().unwrap();
    assert_eq!(message.severity, Severity::Warning);
    assert!(message.text.contains(".qsf"));
}

#[tokio::test]
async fn test_save_declined_overwrite_leaves_file() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("existing.qsf");
    std::fs::write(&target, "FIELDS {old}\n").unwrap();
    let harness = Harness::new(
        species_db(),
        FakeMaps::default(),
        ScriptedPrompter::answering_paths(&[target.to_str().unwrap()]).then_yes_no(&[false]),
    );
    let mut session = session_with(&harness, test_config(dir.path()), Arc::default());
    session.edit(QueryEdit::Columns("TaxonName".into()));

    assert_eq!(session.save_query().await.unwrap(), None);
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "FIELDS {old}\n");
    assert_eq!(harness.prompter.questions().len(), 1);
}

#[tokio::test]
async fn test_load_replaces_query() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("birds.qsf");
    std::fs::write(
        &file,
        "FIELDS {TaxonName}\nFROM {Species}\nWHERE {TaxonGroup = 'Birds'$$AND Year > 2000}\n\
         GROUP BY {}\nORDER BY {TaxonName}\nFORMAT {Text file (tab delimited)}\n",
    )
    .unwrap();
    let harness = Harness::new(
        species_db(),
        FakeMaps::default(),
        ScriptedPrompter::answering_paths(&[file.to_str().unwrap()]),
    );
    let mut session = session_with(&harness, test_config(dir.path()), Arc::default());
    session.edit(QueryEdit::GroupBy("leftover".into()));
    session.edit(QueryEdit::OutputFormat(Some(OutputFormat::Csv)));

    let loaded = session.load_query().await.unwrap();

    assert_eq!(loaded, Some(file));
    let state = session.state();
    assert_eq!(state.columns, "TaxonName");
    assert_eq!(state.selected_table.as_deref(), Some("Species"));
    assert_eq!(state.where_clause, "TaxonGroup = 'Birds'\nAND Year > 2000");
    assert!(state.group_by.is_empty());
    assert_eq!(state.selected_output_format, Some(OutputFormat::Txt));
    assert_eq!(state.saved_query_name.as_deref(), Some("birds"));
}

#[tokio::test]
async fn test_load_rejects_other_files() {
    let dir = TempDir::new().unwrap();
    let wrong = dir.path().join("notes.txt");
    std::fs::write(&wrong, "FIELDS {x}\n").unwrap();
    let missing = dir.path().join("gone.qsf");
    let harness = Harness::new(
        species_db(),
        FakeMaps::default(),
        ScriptedPrompter::answering_paths(&[wrong.to_str().unwrap(), missing.to_str().unwrap()]),
    );
    let mut session = session_with(&harness, test_config(dir.path()), Arc::default());
    session.edit(QueryEdit::Columns("kept".into()));

    assert_eq!(session.load_query().await.unwrap(), None);
    assert_eq!(session.message().unwrap().severity, Severity::Warning);

    assert_eq!(session.load_query().await.unwrap(), None);
    assert!(session.message().unwrap().text.contains("does not exist"));
    assert_eq!(session.state().columns, "kept");
}

#[tokio::test]
async fn test_run_returns_pane_to_idle() {
    let dir = TempDir::new().unwrap();
    let harness = Harness::new(
        species_db()
            .creates("dbo.Species_point_jbloggs", 4)
            .creates("dbo.Species_poly_jbloggs", 1),
        FakeMaps::default(),
        ScriptedPrompter::answering_paths(&["/out/species.shp"]),
    );
    let mut session = session_with(&harness, test_config(dir.path()), Arc::default());
    session.refresh_tables().await.unwrap();
    session.edit(QueryEdit::Columns("*".into()));
    session.edit(QueryEdit::Table(Some("Species".into())));
    session.edit(QueryEdit::OutputFormat(Some(OutputFormat::Shapefile)));

    let report = session.run().await;

    assert_eq!(report.status, RunStatus::Success, "{}", report.message);
    assert_eq!(session.processing(), ProcessingState::Idle);
    assert_eq!(session.pipeline().counts().total(), 5);
    let message = session.message().unwrap();
    assert_eq!(message.text, "Process complete!");
    assert_eq!(message.severity, Severity::Success);
    assert!(session.enablement().run);
}

#[tokio::test]
async fn test_run_refused_while_disabled() {
    let dir = TempDir::new().unwrap();
    let harness = Harness::new(
        species_db().creates("dbo.Species_jbloggs", 3),
        FakeMaps::default(),
        ScriptedPrompter::answering_paths(&["/out/species.csv"]),
    );
    let mut session = session_with(&harness, test_config(dir.path()), Arc::default());
    session.edit(QueryEdit::Columns("TaxonName".into()));
    session.edit(QueryEdit::Table(Some("Species".into())));
    session.edit(QueryEdit::OutputFormat(Some(OutputFormat::Csv)));
    // Table list never loaded
    assert!(!session.enablement().run);

    let report = session.run().await;

    assert_eq!(report.status, RunStatus::Rejected);
    assert!(harness.db.commands().is_empty());
    assert_eq!(harness.prompter.path_prompts(), 0);
    assert!(harness.host.running.lock().is_empty());
    assert_eq!(session.message().unwrap().severity, Severity::Warning);
    assert_eq!(session.processing(), ProcessingState::Idle);
}

#[tokio::test]
async fn test_refresh_dropping_table_clears_message() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("old.qsf");
    std::fs::write(&file, "FIELDS {*}\nFROM {Retired}\n").unwrap();
    let harness = Harness::new(
        species_db(),
        FakeMaps::default(),
        ScriptedPrompter::answering_paths(&[file.to_str().unwrap()]),
    );
    let mut session = session_with(&harness, test_config(dir.path()), Arc::default());

    session.load_query().await.unwrap();
    assert_eq!(session.state().selected_table.as_deref(), Some("Retired"));
    assert!(session.message().is_some());

    session.refresh_tables().await.unwrap();

    assert_eq!(session.state().selected_table, None);
    assert!(session.message().is_none());
}

#[tokio::test]
async fn test_refresh_keeping_table_keeps_message() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("species.qsf");
    std::fs::write(&file, "FIELDS {*}\nFROM {Species}\n").unwrap();
    let harness = Harness::new(
        species_db(),
        FakeMaps::default(),
        ScriptedPrompter::answering_paths(&[file.to_str().unwrap()]),
    );
    let mut session = session_with(&harness, test_config(dir.path()), Arc::default());

    session.load_query().await.unwrap();
    session.refresh_tables().await.unwrap();

    assert_eq!(session.state().selected_table.as_deref(), Some("Species"));
    assert_eq!(session.message().unwrap().severity, Severity::Info);
}
