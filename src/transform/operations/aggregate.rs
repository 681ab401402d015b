//! Aggregate operation
//!
//! Rows are grouped by the values of the group-by fields. Groups keep the
//! order in which their first row appeared.

use crate::domain::{as_number, find_field, number_value, DataRecord, FieldType, SchemaField};
use crate::protocol::{RowError, RowErrorKind};
use crate::transform::rules::{AggregateFunction, AggregateParams};
use serde_json::Value;
use std::collections::HashMap;

/// Name of the group-size column
pub const COUNT_FIELD: &str = "count";

/// One output column of an aggregate
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedAggregation {
    pub field: String,
    pub function: AggregateFunction,
    pub output: String,
}

/// Resolved grouping and reductions
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatePlan {
    pub group_by: Vec<String>,
    pub aggregations: Vec<PlannedAggregation>,
    pub include_count: bool,
}

impl AggregatePlan {
    /// Resolve defaults against the current schema
    ///
    /// `Err` means there is nothing to compute.
    pub fn build(
        source_field: &str,
        params: &AggregateParams,
        schema: &[SchemaField],
    ) -> Result<Self, String> {
        let group_by = if params.group_by.is_empty() {
            vec![source_field.to_string()]
        } else {
            params.group_by.clone()
        };

        let requested: Vec<(String, AggregateFunction, Option<String>)> =
            if params.aggregations.is_empty() {
                let function = params.function.unwrap_or(AggregateFunction::Sum);
                schema
                    .iter()
                    .filter(|f| f.field_type == FieldType::Number && !group_by.contains(&f.name))
                    .map(|f| (f.name.clone(), function, None))
                    .collect()
            } else {
                params
                    .aggregations
                    .iter()
                    .map(|a| (a.field.clone(), a.function, a.alias.clone()))
                    .collect()
            };

        let aggregations = requested
            .iter()
            .map(|(field, function, alias)| {
                let repeated = requested.iter().filter(|(f, _, _)| f == field).count() > 1;
                let output = match alias {
                    Some(alias) => alias.clone(),
                    None if repeated => format!("{field}_{function}"),
                    None => field.clone(),
                };
                PlannedAggregation {
                    field: field.clone(),
                    function: *function,
                    output,
                }
            })
            .collect::<Vec<_>>();

        if aggregations.is_empty() && !params.include_count {
            return Err("aggregate has no fields to compute".to_string());
        }

        Ok(Self {
            group_by,
            aggregations,
            include_count: params.include_count,
        })
    }

    /// Output schema: group fields, aggregated fields, then count
    pub fn output_schema(&self, schema: &[SchemaField]) -> Vec<SchemaField> {
        let mut out: Vec<SchemaField> = self
            .group_by
            .iter()
            .map(|name| {
                find_field(schema, name)
                    .cloned()
                    .unwrap_or_else(|| SchemaField::new(name.clone(), FieldType::Text))
            })
            .collect();
        out.extend(
            self.aggregations
                .iter()
                .map(|a| SchemaField::new(a.output.clone(), FieldType::Number)),
        );
        if self.include_count {
            out.push(SchemaField::new(COUNT_FIELD, FieldType::Number));
        }
        out
    }

    /// Collapse rows into one record per group
    pub fn apply(&self, data: &[DataRecord]) -> (Vec<DataRecord>, Vec<RowError>) {
        let mut keys: Vec<Vec<Value>> = Vec::new();
        let mut members: Vec<Vec<usize>> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for (row, record) in data.iter().enumerate() {
            let key: Vec<Value> = self
                .group_by
                .iter()
                .map(|f| record.get(f).cloned().unwrap_or(Value::Null))
                .collect();
            let lookup = Value::Array(key.clone()).to_string();
            let slot = *index.entry(lookup).or_insert_with(|| {
                keys.push(key);
                members.push(Vec::new());
                keys.len() - 1
            });
            members[slot].push(row);
        }

        let mut errors = Vec::new();
        let mut output = Vec::with_capacity(keys.len());

        for (key, rows) in keys.into_iter().zip(members) {
            let mut record = DataRecord::new();
            for (field, value) in self.group_by.iter().zip(key) {
                record.insert(field.clone(), value);
            }

            for agg in &self.aggregations {
                let value = reduce(data, &rows, agg, &mut errors);
                record.insert(agg.output.clone(), value);
            }

            if self.include_count {
                record.insert(COUNT_FIELD.to_string(), Value::from(rows.len()));
            }
            output.push(record);
        }

        (output, errors)
    }
}

fn reduce(
    data: &[DataRecord],
    rows: &[usize],
    agg: &PlannedAggregation,
    errors: &mut Vec<RowError>,
) -> Value {
    let mut numbers = Vec::with_capacity(rows.len());
    let mut present = 0usize;

    for &row in rows {
        match data[row].get(&agg.field) {
            None | Some(Value::Null) => {}
            Some(value) => {
                present += 1;
                if agg.function == AggregateFunction::Count {
                    continue;
                }
                match as_number(value) {
                    Some(n) => numbers.push(n),
                    None => errors.push(RowError::new(
                        RowErrorKind::Aggregation,
                        row,
                        &agg.field,
                        format!("non-numeric value skipped by {}", agg.function),
                    )),
                }
            }
        }
    }

    match agg.function {
        AggregateFunction::Count => Value::from(present),
        AggregateFunction::Sum => number_value(numbers.iter().sum()),
        AggregateFunction::Avg if numbers.is_empty() => Value::Null,
        AggregateFunction::Avg => {
            number_value(numbers.iter().sum::<f64>() / numbers.len() as f64)
        }
        AggregateFunction::Min => numbers
            .into_iter()
            .reduce(f64::min)
            .map(number_value)
            .unwrap_or(Value::Null),
        AggregateFunction::Max => numbers
            .into_iter()
            .reduce(f64::max)
            .map(number_value)
            .unwrap_or(Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::infer_schema;
    use crate::transform::rules::Aggregation;
    use serde_json::json;

    fn records(value: Value) -> Vec<DataRecord> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect()
    }

    #[test]
    fn test_default_plan_sums_numeric_fields() {
        let data = records(json!([
            {"cat": "A", "v": 1},
            {"cat": "B", "v": 2},
            {"cat": "A", "v": 3}
        ]));
        let schema = infer_schema(&data);
        let plan = AggregatePlan::build("cat", &AggregateParams::default(), &schema).unwrap();

        let (out, errors) = plan.apply(&data);
        assert!(errors.is_empty());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], *json!({"cat": "A", "v": 4}).as_object().unwrap());
        assert_eq!(out[1], *json!({"cat": "B", "v": 2}).as_object().unwrap());
    }

    #[test]
    fn test_count_matches_input_rows() {
        let data = records(json!([
            {"cat": "A"}, {"cat": "B"}, {"cat": "A"}, {"cat": null}
        ]));
        let params = AggregateParams {
            include_count: true,
            ..AggregateParams::default()
        };
        let plan = AggregatePlan::build("cat", &params, &infer_schema(&data)).unwrap();
        let (out, _) = plan.apply(&data);

        let total: u64 = out.iter().map(|r| r[COUNT_FIELD].as_u64().unwrap()).sum();
        assert_eq!(total, 4);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_repeated_field_gets_suffixed_names() {
        let params = AggregateParams {
            group_by: vec!["cat".to_string()],
            aggregations: vec![
                Aggregation {
                    field: "v".to_string(),
                    function: AggregateFunction::Min,
                    alias: None,
                },
                Aggregation {
                    field: "v".to_string(),
                    function: AggregateFunction::Max,
                    alias: None,
                },
                Aggregation {
                    field: "w".to_string(),
                    function: AggregateFunction::Avg,
                    alias: Some("mean_w".to_string()),
                },
            ],
            ..AggregateParams::default()
        };
        let plan = AggregatePlan::build("cat", &params, &[]).unwrap();
        let outputs: Vec<_> = plan.aggregations.iter().map(|a| a.output.as_str()).collect();
        assert_eq!(outputs, vec!["v_min", "v_max", "mean_w"]);
    }

    #[test]
    fn test_non_numeric_values_are_recorded() {
        let data = records(json!([
            {"cat": "A", "v": 1},
            {"cat": "A", "v": "n/a"}
        ]));
        let params = AggregateParams {
            aggregations: vec![Aggregation {
                field: "v".to_string(),
                function: AggregateFunction::Avg,
                alias: None,
            }],
            ..AggregateParams::default()
        };
        let plan = AggregatePlan::build("cat", &params, &[]).unwrap();
        let (out, errors) = plan.apply(&data);

        assert_eq!(out[0]["v"], json!(1));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].row, 1);
        assert_eq!(errors[0].kind, RowErrorKind::Aggregation);
    }

    #[test]
    fn test_nothing_to_compute_is_rejected() {
        let schema = vec![SchemaField::new("cat", FieldType::Text)];
        assert!(AggregatePlan::build("cat", &AggregateParams::default(), &schema).is_err());
    }

    #[test]
    fn test_output_schema() {
        let schema = vec![
            SchemaField::new("cat", FieldType::Text),
            SchemaField::new("v", FieldType::Number),
        ];
        let params = AggregateParams {
            include_count: true,
            ..AggregateParams::default()
        };
        let plan = AggregatePlan::build("cat", &params, &schema).unwrap();
        let names: Vec<_> = plan
            .output_schema(&schema)
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["cat", "v", "count"]);
    }
}
