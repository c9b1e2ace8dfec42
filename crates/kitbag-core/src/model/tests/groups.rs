use super::*;

fn base_model() -> (Model, VariableId, VariableId) {
    let mut model = Model::new();
    let x = model.add_named_variable("x", Variable::binary()).unwrap();
    let y = model.add_named_variable("y", Variable::binary()).unwrap();
    (model, x, y)
}

#[test]
fn commit_registers_group_and_tags_rows() {
    let (mut model, x, y) = base_model();

    let (row, group) = model
        .with_group("volume", |scope| {
            assert_eq!(scope.name(), "volume");
            let row = scope
                .add_constraint_expr((Expr::term(x, 2.0) + Expr::term(y, 4.0)).le_scalar(5.0))?;
            assert_eq!(scope.pending_constraints(), 1);
            Ok::<_, ModelError>(row)
        })
        .unwrap();

    assert_eq!(group.name(), "volume");
    assert_eq!(group.constraints(), &[row]);
    assert!(group.variables().is_empty());
    assert_eq!(model.group_names(), vec!["volume"]);
    assert_eq!(model.group_of_constraint(row).map(ConstraintGroup::name), Some("volume"));
    assert_eq!(
        model.get_constraint_metadata(row),
        Some(&serde_json::json!({"group": "volume"}))
    );
}

#[test]
fn failed_build_leaves_model_unchanged() {
    let (mut model, x, y) = base_model();
    model.maximize(Expr::term(x, 10.0) + Expr::term(y, 6.0)).unwrap();
    model
        .with_group("volume", |scope| {
            scope.add_constraint_expr(Expr::var(x).le_scalar(1.0))
        })
        .unwrap();
    let before = model.clone();

    let result = model.with_group("bags", |scope| {
        let aux = scope.add_named_variable("aux", Variable::binary())?;
        scope.add_named_constraint("link", (Expr::var(aux) - Expr::var(x)).eq_scalar(0.0))?;
        // Referencing a variable that does not exist aborts the group.
        scope.add_constraint_expr(Expr::var(VariableId::new(42)).le_scalar(1.0))
    });

    assert_eq!(
        result.unwrap_err(),
        ModelError::InvalidVariableId(VariableId::new(42))
    );
    assert_eq!(model.num_variables(), before.num_variables());
    assert_eq!(model.num_constraints(), before.num_constraints());
    assert_eq!(model.num_coefficients(), before.num_coefficients());
    assert_eq!(model.rows(), before.rows());
    assert_eq!(model.objective(), before.objective());
    assert!(model.get_variable_name(VariableId::new(2)).is_none());
    assert!(model.get_constraint_by_name("link").is_none());
    assert_eq!(model.group_names(), vec!["volume"]);
}

#[test]
fn rollback_keeps_existing_rows_and_names() {
    let (mut model, x, y) = base_model();
    model.maximize(Expr::var(x)).unwrap();
    model.set_objective_name(Some("value".to_string()));
    let (row, _) = model
        .with_group("volume", |scope| {
            scope.add_named_constraint("volume_capacity", Expr::term(x, 2.0).le_scalar(5.0))
        })
        .unwrap();
    let column_before = model.get_column(x).cloned();

    {
        let mut scope = model.begin_group("weight").unwrap();
        // New rows over x extend its column; the rollback must trim only those.
        scope
            .add_named_constraint(
                "weight_capacity",
                (Expr::term(x, 99.0) + Expr::var(y)).le_scalar(3.0),
            )
            .unwrap();
        scope.add_named_variable("x_copy", Variable::binary()).unwrap();
        assert_eq!(scope.get_column(x).map(Vec::len), Some(2));
    }

    assert_eq!(model.get_column(x).cloned(), column_before);
    assert_eq!(model.get_column(x), Some(&vec![(row, 2.0)]));
    assert!(model.get_column(y).is_none());
    assert_eq!(model.get_variable_name(x), Some("x"));
    assert_eq!(model.get_constraint_name(row), Some("volume_capacity"));
    assert_eq!(
        model.get_constraint_metadata(row),
        Some(&serde_json::json!({"group": "volume"}))
    );
    assert_eq!(model.objective().terms, vec![(x, 1.0)]);
    assert_eq!(model.get_objective_name(), Some("value"));
    assert!(model.get_constraint_by_name("weight_capacity").is_none());
    assert_eq!(model.group_names(), vec!["volume"]);
}

#[test]
fn dropped_scope_rolls_back() {
    let (mut model, x, _) = base_model();
    {
        let mut scope = model.begin_group("weight").unwrap();
        scope.add_variable(Variable::binary()).unwrap();
        scope
            .add_constraint_expr(Expr::var(x).le_scalar(3.0))
            .unwrap();
        assert_eq!(scope.pending_variables(), 1);
    }

    assert_eq!(model.num_variables(), 2);
    assert_eq!(model.num_constraints(), 0);
    assert!(model.groups().is_empty());
    // The name is free again after a discarded build.
    assert!(model.begin_group("weight").is_ok());
}

#[test]
fn duplicate_group_name_rejected() {
    let (mut model, x, _) = base_model();
    model
        .with_group("value", |scope| {
            scope.add_constraint_expr(Expr::term(x, 10.0).le_scalar(100.0))
        })
        .unwrap();

    let err = model.begin_group("value").unwrap_err();
    assert_eq!(err, ModelError::DuplicateGroup("value".to_string()));
    assert_eq!(model.num_constraints(), 1);
}

#[test]
fn scope_reads_through_to_model() {
    let (mut model, x, _) = base_model();
    let mut scope = model.begin_group("bags").unwrap();
    assert_eq!(scope.get_variable_name(x), Some("x"));
    assert_eq!(scope.num_variables(), 2);
    scope
        .add_constraint_expr(Expr::var(x).le_scalar(1.0))
        .unwrap();
    let group = scope.commit();
    assert_eq!(group.constraints().len(), 1);
    assert!(model.begin_group("weight").is_ok());
}

#[test]
fn auxiliary_variables_belong_to_group() {
    let (mut model, x, _) = base_model();
    let (aux, group) = model
        .with_group("bags", |scope| {
            let aux = scope.add_variable(Variable::integer(Bounds::new(0.0, 3.0)))?;
            scope.add_constraint_expr((Expr::var(aux) - Expr::var(x)).eq_scalar(0.0))?;
            Ok::<_, ModelError>(aux)
        })
        .unwrap();

    assert_eq!(group.variables(), &[aux]);
    let snapshot = model.inspect(InspectOptions::default());
    let view = snapshot
        .variables
        .iter()
        .find(|view| view.id == aux)
        .unwrap();
    assert_eq!(view.group.as_deref(), Some("bags"));
    assert!(view.is_integer);
}
