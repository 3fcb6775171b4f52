//! Integration tests for building migration specs and resolving step ranges.

use schema_migrations::*;
use serde_json::json;

#[ctor::ctor]
fn init() {
    colog::init();
}

fn column(name: &str, column_type: &str) -> ColumnArgs {
    ColumnArgs::new(name, column_type)
}

fn posts_subtitle_and_pin() -> MigrationStep {
    add_columns(AddColumnsArgs::new(
        "posts",
        vec![
            column("subtitle", "string").optional(),
            column("is_pinned", "boolean"),
        ],
    ))
    .unwrap()
}

fn posts_author() -> MigrationStep {
    add_columns(AddColumnsArgs::new(
        "posts",
        vec![column("author_id", "string").indexed()],
    ))
    .unwrap()
}

fn comments_table() -> MigrationStep {
    create_table(CreateTableArgs::new(
        "comments",
        vec![
            column("post_id", "string").indexed(),
            column("body", "string"),
        ],
    ))
    .unwrap()
}

fn spec_json(spec: &MigrationSpec) -> serde_json::Value {
    serde_json::to_value(spec).unwrap()
}

#[test]
fn basic_specs() {
    assert_eq!(
        spec_json(&schema_migrations(vec![]).unwrap()),
        json!({ "sortedMigrations": [], "validated": true, "minVersion": 1, "maxVersion": 1 })
    );
    assert_eq!(
        spec_json(&schema_migrations(vec![Migration::new(2, vec![])]).unwrap()),
        json!({
            "sortedMigrations": [{ "toVersion": 2, "steps": [] }],
            "validated": true,
            "minVersion": 1,
            "maxVersion": 2,
        })
    );
    assert_eq!(
        spec_json(&schema_migrations(vec![Migration::new(4, vec![])]).unwrap()),
        json!({
            "sortedMigrations": [{ "toVersion": 4, "steps": [] }],
            "validated": true,
            "minVersion": 3,
            "maxVersion": 4,
        })
    );
}

#[test]
fn complex_spec_is_sorted_and_normalized() {
    let spec = schema_migrations(vec![
        Migration::new(
            7,
            vec![
                make_column_optional(MakeColumnOptionalArgs::new("comments", "body")).unwrap(),
                make_column_required(MakeColumnRequiredArgs::new("comments", "body", "")).unwrap(),
            ],
        ),
        Migration::new(
            6,
            vec![destroy_table(DestroyTableArgs::new("comments")).unwrap()],
        ),
        Migration::new(
            5,
            vec![rename_column(RenameColumnArgs::new("comments", "text", "body")).unwrap()],
        ),
        Migration::new(
            4,
            vec![
                add_columns(AddColumnsArgs::new("comments", vec![column("text", "string")]))
                    .unwrap(),
                destroy_column(DestroyColumnArgs::new("comments", "body")).unwrap(),
            ],
        ),
        Migration::new(3, vec![comments_table(), posts_author()]),
        Migration::new(2, vec![posts_subtitle_and_pin()]),
    ])
    .unwrap();

    let expected = json!({
        "validated": true,
        "minVersion": 1,
        "maxVersion": 7,
        "sortedMigrations": [
            {
                "toVersion": 2,
                "steps": [{
                    "type": "add_columns",
                    "table": "posts",
                    "columns": [
                        { "name": "subtitle", "type": "string", "isOptional": true },
                        { "name": "is_pinned", "type": "boolean" },
                    ],
                }],
            },
            {
                "toVersion": 3,
                "steps": [
                    {
                        "type": "create_table",
                        "schema": {
                            "name": "comments",
                            "columns": {
                                "post_id": { "name": "post_id", "type": "string", "isIndexed": true },
                                "body": { "name": "body", "type": "string" },
                            },
                            "columnArray": [
                                { "name": "post_id", "type": "string", "isIndexed": true },
                                { "name": "body", "type": "string" },
                            ],
                        },
                    },
                    {
                        "type": "add_columns",
                        "table": "posts",
                        "columns": [{ "name": "author_id", "type": "string", "isIndexed": true }],
                    },
                ],
            },
            {
                "toVersion": 4,
                "steps": [
                    {
                        "type": "add_columns",
                        "table": "comments",
                        "columns": [{ "name": "text", "type": "string" }],
                    },
                    { "type": "destroy_column", "table": "comments", "column": "body" },
                ],
            },
            {
                "toVersion": 5,
                "steps": [
                    { "type": "rename_column", "table": "comments", "from": "text", "to": "body" },
                ],
            },
            {
                "toVersion": 6,
                "steps": [{ "type": "destroy_table", "table": "comments" }],
            },
            {
                "toVersion": 7,
                "steps": [
                    { "type": "make_column_optional", "table": "comments", "column": "body" },
                    {
                        "type": "make_column_required",
                        "table": "comments",
                        "column": "body",
                        "defaultValue": "",
                    },
                ],
            },
        ],
    });

    assert_eq!(spec_json(&spec), expected);
    assert_eq!(spec.step_count(), 9);
}

#[test]
fn malformed_migrations_are_rejected() {
    let err = migrations_from_value(&json!({ "migrations": [{}] })).unwrap_err();
    assert!(err.to_string().contains("Invalid migration"));

    for version in [0, 1] {
        let err = schema_migrations(vec![Migration::new(version, vec![])]).unwrap_err();
        let message = err.to_string().to_lowercase();
        assert!(message.contains("minimum"), "{message}");
        assert!(message.ends_with("is 2"), "{message}");
    }

    let err = migrations_from_value(&json!({
        "migrations": [{ "toVersion": 2, "steps": [{ "table": "x" }] }]
    }))
    .unwrap_err();
    assert!(err.to_string().contains("Invalid migration steps"));
}

#[test]
fn gaps_and_duplicates_are_rejected() {
    let versions = |vs: &[SchemaVersion]| {
        schema_migrations(vs.iter().map(|&v| Migration::new(v, vec![])).collect())
    };

    assert!(versions(&[2, 2]).unwrap_err().to_string().contains("duplicates"));
    assert!(versions(&[5, 4, 2]).unwrap_err().to_string().contains("gaps"));

    // starting above 2 is fine, in either order
    assert!(versions(&[6, 5, 4]).is_ok());
    assert!(versions(&[4, 5, 6]).is_ok());
}

#[test]
fn malformed_constructor_input() {
    let message = |r: Result<MigrationStep>| r.unwrap_err().to_string();

    assert!(message(create_table(CreateTableArgs {
        columns: Some(vec![]),
        ..Default::default()
    }))
    .contains("name"));
    assert!(message(create_table(CreateTableArgs::new("foo", vec![column("x", "blah")])))
        .contains("type"));

    assert!(message(add_columns(AddColumnsArgs {
        columns: Some(vec![ColumnArgs::default()]),
        ..Default::default()
    }))
    .contains("table"));
    assert!(message(add_columns(AddColumnsArgs {
        table: Some("foo".into()),
        ..Default::default()
    }))
    .contains("columns"));
    assert!(message(add_columns(AddColumnsArgs::new("foo", vec![column("x", "blah")])))
        .contains("type"));

    assert!(message(destroy_column(DestroyColumnArgs {
        column: Some("foo".into()),
        ..Default::default()
    }))
    .contains("table"));
    assert!(message(destroy_column(DestroyColumnArgs {
        table: Some("foo".into()),
        ..Default::default()
    }))
    .contains("column"));

    assert!(message(rename_column(RenameColumnArgs {
        from: Some("text".into()),
        to: Some("body".into()),
        ..Default::default()
    }))
    .contains("table"));
    assert_eq!(
        rename_column(RenameColumnArgs {
            table: Some("foo".into()),
            from: Some("text".into()),
            ..Default::default()
        }),
        Err(MigrationError::MalformedField {
            step: StepKind::RenameColumn,
            field: "to"
        })
    );
    assert_eq!(
        rename_column(RenameColumnArgs {
            table: Some("foo".into()),
            to: Some("body".into()),
            ..Default::default()
        }),
        Err(MigrationError::MalformedField {
            step: StepKind::RenameColumn,
            field: "from"
        })
    );

    assert!(message(destroy_table(DestroyTableArgs::default())).contains("table"));
}

#[test]
fn columns_must_be_a_list_in_definitions() {
    let err = step_from_value(&json!({
        "type": "add_columns",
        "table": "foo",
        "columns": { "name": "x", "type": "blah" },
    }))
    .unwrap_err();
    assert!(err.to_string().contains("columns"));
}

#[test]
fn unsafe_names_are_rejected_everywhere() {
    let unsafe_names = [
        "\"hey\"",
        "'hey'",
        "`hey`",
        "foo' and delete * from users --",
        "id",
        "_changed",
        "_status",
        "local_storage",
        "$loki",
        "__foo",
        "__proto__",
        "toString",
        "valueOf",
        "oid",
        "_rowid_",
        "ROWID",
    ];

    for name in unsafe_names {
        let attempts = [
            create_table(CreateTableArgs::new("foo", vec![column(name, "string")])),
            create_table(CreateTableArgs::new(name, vec![column("hey", "string")])),
            add_columns(AddColumnsArgs::new("foo", vec![column(name, "string")])),
            rename_column(RenameColumnArgs::new("foo", "hey", name)),
        ];
        for attempt in attempts {
            let err = attempt.unwrap_err();
            assert!(
                matches!(err, MigrationError::UnsafeName { .. }),
                "{name:?} was accepted or misreported: {err:?}"
            );
            assert!(err.to_string().contains("name"));
        }
    }
}

#[test]
fn finds_the_right_migration_steps() {
    let step1 = posts_subtitle_and_pin();
    let step2 = posts_author();
    let step3 = comments_table();

    let spec = schema_migrations(vec![
        Migration::new(5, vec![step2.clone(), step3.clone()]),
        Migration::new(4, vec![]),
        Migration::new(3, vec![step1.clone()]),
    ])
    .unwrap();

    assert_eq!(steps_for_migration(&spec, 2, 3), Some(vec![&step1]));
    assert_eq!(steps_for_migration(&spec, 2, 4), Some(vec![&step1]));
    assert_eq!(
        steps_for_migration(&spec, 2, 5),
        Some(vec![&step1, &step2, &step3])
    );
    assert_eq!(steps_for_migration(&spec, 3, 5), Some(vec![&step2, &step3]));
    assert_eq!(steps_for_migration(&spec, 3, 4), Some(vec![]));
    assert_eq!(steps_for_migration(&spec, 4, 5), Some(vec![&step2, &step3]));

    // no available steps
    let empty = schema_migrations(vec![]).unwrap();
    assert_eq!(steps_for_migration(&empty, 1, 2), None);
    assert_eq!(steps_for_migration(&spec, 1, 2), None);
    assert_eq!(steps_for_migration(&spec, 1, 3), None);
    assert_eq!(steps_for_migration(&spec, 1, 5), None);
    assert_eq!(steps_for_migration(&spec, 3, 6), None);
    assert_eq!(steps_for_migration(&spec, 5, 6), None);
}

#[test]
fn memory_schema_follows_a_full_plan() {
    let spec = schema_migrations(vec![
        Migration::new(2, vec![comments_table()]),
        Migration::new(
            3,
            vec![
                add_columns(AddColumnsArgs::new("comments", vec![column("text", "string")]))
                    .unwrap(),
                destroy_column(DestroyColumnArgs::new("comments", "body")).unwrap(),
            ],
        ),
        Migration::new(
            4,
            vec![rename_column(RenameColumnArgs::new("comments", "text", "body")).unwrap()],
        ),
    ])
    .unwrap();

    let mut store = MemorySchema::new();
    let mut executor = MemorySchema::new();
    let outcome = migrate(&spec, &mut store, &mut executor, spec.max_version()).unwrap();

    assert_eq!(
        outcome,
        MigrationOutcome::Migrated {
            from: 1,
            to: 4,
            steps_applied: 4
        }
    );
    let comments = executor.table("comments").unwrap();
    let names: Vec<&str> = comments.columns().map(|(name, _)| name).collect();
    assert_eq!(names, ["post_id", "body"]);
    assert!(comments.column("body").unwrap().column_type == ColumnType::String);
}
