//! Relational validation pass
//!
//! Walks every field of a normalized schema in declaration order. For each
//! field the first matching rule decides its fate: captcha check, control
//! handling, upload gating, alternative and confirm pairs, required and
//! optional emptiness, then pattern matching.
//!
//! Copyright (c) 2025 Formcheck Team
//! Licensed under the Apache-2.0 license

use super::preflight::missing_pattern;
use super::state::PassContext;
use crate::collaborators::ChallengeStore;
use crate::error::Result;
use crate::modifier::ModifierRegistry;
use crate::pattern::Pattern;
use crate::schema::{attr, FieldKind, FieldSpec, FormSchema};
use crate::values::{self, is_empty, is_missing, loosely_equal, scalar_text};
use serde_json::Value;
use tracing::debug;

/// Validator applying field rules and inter-field relationships
pub struct RelationalValidator<'a> {
    form: &'a str,
    registry: &'a ModifierRegistry,
    challenges: &'a dyn ChallengeStore,
}

impl<'a> RelationalValidator<'a> {
    pub fn new(
        form: &'a str,
        registry: &'a ModifierRegistry,
        challenges: &'a dyn ChallengeStore,
    ) -> Self {
        Self {
            form,
            registry,
            challenges,
        }
    }

    /// Run the pass over every field
    ///
    /// Returns whether every field cleared. Schema defects abort the pass
    /// with an error; everything else is recorded in the context.
    pub fn validate(&self, schema: &FormSchema, ctx: &mut PassContext) -> Result<bool> {
        for (name, spec) in schema.iter() {
            self.check_field(schema, name, spec, ctx)?;
        }
        Ok(ctx.failures.is_empty())
    }

    fn check_field(
        &self,
        schema: &FormSchema,
        name: &str,
        spec: &FieldSpec,
        ctx: &mut PassContext,
    ) -> Result<()> {
        if let FieldKind::Captcha(_) = spec.kind {
            self.check_captcha(name, ctx);
            return Ok(());
        }

        self.apply_modifiers(&spec.input_modifiers, name, ctx)?;

        match spec.input_type() {
            Some("submit") => {
                ctx.values.remove(name);
                debug!(field = name, "submit control dropped");
                return Ok(());
            }
            Some("checkbox") => rebind_checkbox(name, spec, ctx),
            _ => {}
        }
        if matches!(spec.kind, FieldKind::Checkboxgroup) && !ctx.values.contains_key(name) {
            ctx.values.insert(name.to_string(), Value::Array(Vec::new()));
        }

        if spec.is_upload() && spec.require {
            let stored = !is_empty(spec.attribute(attr::VALUE)) || !is_empty(ctx.values.get(name));
            if !ctx.is_uploaded(name) && !stored {
                debug!(field = name, "required upload missing");
                ctx.require(name);
            }
            return Ok(());
        }

        let alternative = spec
            .is_alternative_for
            .as_deref()
            .filter(|target| schema.contains(target));
        if let Some(target) = alternative {
            if is_empty(ctx.values.get(target)) && is_empty(ctx.values.get(name)) {
                debug!(field = name, target, "alternative pair left empty");
                ctx.alternative(name, target);
                return Ok(());
            }
        }

        if let Some(target) = spec
            .is_confirm_for
            .as_deref()
            .filter(|target| schema.contains(target))
        {
            self.check_confirm(name, target, ctx);
            return Ok(());
        }

        if spec.require {
            if let Some(value) = ctx.values.get_mut(name) {
                values::trim_value(value);
            }
            if is_missing(ctx.values.get(name)) {
                let covered = alternative.is_some_and(|target| !is_empty(ctx.values.get(target)))
                    || covered_by_sibling(schema, name, ctx);
                if !covered {
                    debug!(field = name, "required value missing");
                    ctx.require(name);
                }
                return Ok(());
            }
        }

        if !spec.require && is_empty(ctx.values.get(name)) {
            return self.apply_modifiers(&spec.output_modifiers, name, ctx);
        }

        if spec.reg_exp.is_empty() {
            if spec.require {
                return Err(missing_pattern(name));
            }
            return self.apply_modifiers(&spec.output_modifiers, name, ctx);
        }
        let pattern = Pattern::resolve(&spec.reg_exp)?;

        if !spec.require && spec.is_multiple_select() {
            if let Some(Value::Array(items)) = ctx.values.get_mut(name) {
                if !items.is_empty() {
                    items.remove(0);
                }
                if items.is_empty() {
                    debug!(field = name, "multiple select empty after pruning");
                    return self.apply_modifiers(&spec.output_modifiers, name, ctx);
                }
            }
        }

        if !matches_pattern(&pattern, ctx.values.get(name)) {
            debug!(field = name, pattern = %spec.reg_exp, "value rejected by pattern");
            ctx.values.remove(name);
            ctx.incorrect(name);
            return Ok(());
        }

        self.apply_modifiers(&spec.output_modifiers, name, ctx)
    }

    fn check_captcha(&self, name: &str, ctx: &mut PassContext) {
        let answer = ctx.values.remove(name);
        if is_empty(answer.as_ref()) {
            debug!(field = name, "captcha not answered");
            ctx.require(name);
            return;
        }
        let expected = self.challenges.current_challenge(self.form, name);
        let given = answer.as_ref().and_then(scalar_text);
        match (expected, given) {
            (Some(expected), Some(given)) if expected == given => {
                self.challenges.invalidate(self.form, name);
            }
            _ => {
                debug!(field = name, "captcha answer mismatch");
                ctx.incorrect(name);
            }
        }
    }

    fn check_confirm(&self, name: &str, target: &str, ctx: &mut PassContext) {
        if !ctx.values.contains_key(target) {
            ctx.values.remove(name);
            return;
        }
        if ctx.values.get(name) == ctx.values.get(target) {
            ctx.values.remove(name);
        } else {
            debug!(field = name, target, "confirmation differs");
            ctx.confirm(name, target);
        }
    }

    fn apply_modifiers(&self, names: &[String], field: &str, ctx: &mut PassContext) -> Result<()> {
        if names.is_empty() {
            return Ok(());
        }
        if let Some(value) = ctx.values.remove(field) {
            let modified = self.registry.apply(names, value)?;
            ctx.values.insert(field.to_string(), modified);
        }
        Ok(())
    }
}

/// Whether a filled field names `name` as its alternative
fn covered_by_sibling(schema: &FormSchema, name: &str, ctx: &PassContext) -> bool {
    schema.iter().any(|(sibling, spec)| {
        sibling != name
            && spec.is_alternative_for.as_deref() == Some(name)
            && !is_empty(ctx.values.get(sibling))
    })
}

/// Replace an unchecked checkbox's value with its `valueOff`
fn rebind_checkbox(name: &str, spec: &FieldSpec, ctx: &mut PassContext) {
    let checked = ctx.values.get(name).is_some()
        && loosely_equal(ctx.values.get(name), spec.attribute(attr::VALUE));
    if checked {
        return;
    }
    match spec.attribute(attr::VALUE_OFF) {
        Some(off) => {
            ctx.values.insert(name.to_string(), off.clone());
        }
        None => {
            ctx.values.remove(name);
        }
    }
}

/// Match a bound value against a pattern
///
/// Scalars match through their text form. Every element of a collection
/// must match, and an empty collection never does.
fn matches_pattern(pattern: &Pattern, value: Option<&Value>) -> bool {
    match value {
        Some(Value::Array(items)) => {
            !items.is_empty()
                && items
                    .iter()
                    .all(|item| scalar_text(item).is_some_and(|text| pattern.is_match(&text)))
        }
        Some(value) => scalar_text(value).is_some_and(|text| pattern.is_match(&text)),
        None => false,
    }
}
