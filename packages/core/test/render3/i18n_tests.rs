//! i18n Tests
//!
//! Translations replayed on rendered templates: reordering, static text creation, removal of
//! omitted placeholders and attribute interpolation.

#[path = "util/mod.rs"]
mod util;

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::util::{empty_context, TemplateFixture};
    use angular_core::render3::i18n::{
        i18n_exp_mapping, i18n_mapping, I18nInstruction, PlaceholderMap,
    };
    use angular_core::render3::{
        Instance, RenderContext, RenderFlags, TemplateFn, ViewContainerRef,
    };
    use angular_core::{Result, RuntimeError};
    use serde_json::json;

    fn placeholders(entries: &[(&str, usize)]) -> PlaceholderMap {
        entries
            .iter()
            .map(|(name, index)| (name.to_string(), *index))
            .collect()
    }

    /// `<div><b></b>{{name}}</div>` translated with `translation`.
    fn translated(translation: &str) -> TemplateFixture {
        let instructions = i18n_mapping(
            translation,
            &[Some(placeholders(&[("START_B", 1)]))],
            &[Some(placeholders(&[("INTERP", 2)]))],
            &[],
            None,
        )
        .unwrap();
        let instructions: Vec<I18nInstruction> = instructions[0].clone();
        TemplateFixture::new(3, 1, move |ctx, flags, _| {
            if flags.contains(RenderFlags::CREATE) {
                ctx.element_start(0, "div", &[])?;
                ctx.element(1, "b", &[])?;
                ctx.text(2, "")?;
                ctx.element_end()?;
                ctx.i18n_apply(1, &instructions)?;
            }
            if flags.contains(RenderFlags::UPDATE) {
                ctx.text_binding(2, json!("World"))?;
            }
            Ok(())
        })
    }

    #[test]
    fn should_create_text_and_move_nodes() {
        let fixture = translated("{$START_B}Hello {$END_B}{$INTERP}");
        assert_eq!(fixture.html(), "<div><b>Hello </b>World</div>");
    }

    #[test]
    fn should_treat_unknown_placeholders_as_closing_tags() {
        // `START_I` / `END_I` are not declared, so both close the current node and the
        // expression lands next to `<b>` under the section root.
        let mut fixture = translated("{$START_B}Hello {$END_B}{$START_I}{$INTERP}{$END_I}");
        assert_eq!(fixture.html(), "<div><b>Hello </b>World</div>");

        let div = fixture.query("div");
        let children = fixture.doc.children(div);
        assert_eq!(children.len(), 2);
        assert_eq!(fixture.doc.tag_name(children[0]).as_deref(), Some("b"));
        assert_eq!(fixture.doc.text_content(children[1]), "World");

        fixture.update();
        assert_eq!(fixture.html(), "<div><b>Hello </b>World</div>");
    }

    #[test]
    fn should_reorder_nodes() {
        let fixture = translated("{$INTERP} {$START_B}Bonjour{$END_B}");
        assert_eq!(fixture.html(), "<div>World <b>Bonjour</b></div>");
    }

    #[test]
    fn should_remove_omitted_placeholders() {
        let mut fixture = translated("Hello");
        assert_eq!(fixture.html(), "<div>Hello</div>");

        // Bindings of removed nodes keep working without reaching the DOM.
        fixture.update();
        assert_eq!(fixture.html(), "<div>Hello</div>");
    }

    #[test]
    fn should_reject_apply_after_bindings() {
        let result = TemplateFixture::try_new(1, 1, |ctx, flags, _| {
            if flags.contains(RenderFlags::CREATE) {
                ctx.text(0, "")?;
            }
            if flags.contains(RenderFlags::UPDATE) {
                ctx.text_binding(0, json!("x"))?;
                ctx.i18n_apply(0, &[])?;
            }
            Ok(())
        });
        assert!(matches!(result, Err(RuntimeError::PhaseViolation(_))));
    }

    #[test]
    fn should_reuse_translated_text_nodes_across_view_instances() {
        let instructions = i18n_mapping(
            "{$START_I}{$END_I}!",
            &[Some(placeholders(&[("START_I", 0)]))],
            &[],
            &[],
            None,
        )
        .unwrap()
        .remove(0);
        let template: TemplateFn = Rc::new(
            move |ctx: &mut RenderContext, flags: RenderFlags, _: &Instance| -> Result<()> {
                if flags.contains(RenderFlags::CREATE) {
                    ctx.element(0, "i", &[])?;
                    ctx.i18n_apply(0, &instructions)?;
                }
                Ok(())
            },
        );
        let mut fixture = TemplateFixture::new(1, 0, move |ctx, flags, _| {
            if flags.contains(RenderFlags::CREATE) {
                ctx.template(0, template.clone(), 1, 0, None, &[])?;
            }
            Ok(())
        });
        let vcr = ViewContainerRef {
            view: fixture.component.component_view,
            index: 0,
        };
        let anchor = vcr.anchor(&fixture.ctx).unwrap();
        let factory = fixture.ctx.get_embedded_view_factory(anchor).unwrap();
        for _ in 0..2 {
            vcr.create_embedded_view(&mut fixture.ctx, &factory, empty_context(), None)
                .unwrap();
        }
        assert_eq!(fixture.html(), "<!--container--><i></i>!<i></i>!");
    }

    #[test]
    fn should_interpolate_translated_attributes() {
        let exp = i18n_exp_mapping(
            "{$COUNT} items for {$NAME}",
            &placeholders(&[("NAME", 0), ("COUNT", 1)]),
        );
        let results = Rc::new(RefCell::new(Vec::new()));
        let sink = results.clone();
        let mut fixture = TemplateFixture::new(1, 2, move |ctx, flags, _| {
            if flags.contains(RenderFlags::CREATE) {
                ctx.element(0, "span", &[])?;
            }
            if flags.contains(RenderFlags::UPDATE) {
                let title = ctx.i18n_interpolation(&exp, &[json!("Bob"), json!(3)])?;
                sink.borrow_mut().push(title);
            }
            Ok(())
        });
        fixture.update();
        assert_eq!(
            *results.borrow(),
            vec![Some("3 items for Bob".to_string()), None]
        );
    }
}
