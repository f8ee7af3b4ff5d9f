//! Dependency Injection Tests
//!
//! Node injector lookup: providers, directives, view providers, multi providers, embedded view
//! declarations and the module injector fallback.

#[path = "util/mod.rs"]
mod util;

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::util::{empty_context, TemplateFixture};
    use angular_core::render3::{
        DirectiveDef, DirectiveDefRef, Injector, Instance, Provider, RenderContext, RenderFlags,
        StaticInjector, TemplateFn, ViewContainerRef,
    };
    use angular_core::{Result, RuntimeError};

    type Seen = Rc<RefCell<Vec<String>>>;

    fn text(value: &str) -> Instance {
        Rc::new(value.to_string())
    }

    fn as_text(instance: &Instance) -> String {
        instance
            .downcast_ref::<String>()
            .cloned()
            .unwrap_or_else(|| "<not a string>".to_string())
    }

    /// Directive providing `token` with a string value.
    fn providing(name: &str, token: &str, value: &str) -> DirectiveDefRef {
        DirectiveDef::directive(name, |_| Ok(empty_context()))
            .with_providers(vec![Provider::value(token, text(value))])
            .into_ref()
    }

    /// Directive recording the string it injects for `token`.
    fn probe(token: &str, seen: &Seen) -> DirectiveDefRef {
        let token = token.to_string();
        let seen = seen.clone();
        DirectiveDef::directive("Probe", move |ctx| {
            let value = ctx.directive_inject(&token)?;
            seen.borrow_mut().push(as_text(&value));
            Ok(empty_context())
        })
        .into_ref()
    }

    /// Renders `<section [outer]><input [inner]></section>`.
    fn nested(outer: Vec<DirectiveDefRef>, inner: Vec<DirectiveDefRef>) -> Result<TemplateFixture> {
        TemplateFixture::try_new(2, 0, move |ctx, flags, _| {
            if flags.contains(RenderFlags::CREATE) {
                ctx.element_start_with(0, "section", &[], &outer)?;
                ctx.element_start_with(1, "input", &[], &inner)?;
                ctx.element_end()?;
                ctx.element_end()?;
            }
            Ok(())
        })
    }

    #[test]
    fn should_inject_providers_of_ancestor_nodes() {
        let seen = Seen::default();
        nested(
            vec![providing("Outer", "Config", "outer")],
            vec![probe("Config", &seen)],
        )
        .unwrap();
        assert_eq!(*seen.borrow(), vec!["outer"]);
    }

    #[test]
    fn should_prefer_the_closest_provider() {
        let seen = Seen::default();
        nested(
            vec![providing("Outer", "Config", "outer")],
            vec![providing("Inner", "Config", "inner"), probe("Config", &seen)],
        )
        .unwrap();
        assert_eq!(*seen.borrow(), vec!["inner"]);
    }

    #[test]
    fn should_inject_directives_by_type() {
        struct Form {
            name: String,
        }
        let form = DirectiveDef::directive("Form", |_| {
            Ok(Rc::new(Form {
                name: "login".to_string(),
            }) as Instance)
        })
        .into_ref();
        let seen = Seen::default();
        let sink = seen.clone();
        let control = DirectiveDef::directive("Control", move |ctx| {
            let form = ctx.directive_inject("Form")?;
            if let Some(form) = form.downcast_ref::<Form>() {
                sink.borrow_mut().push(form.name.clone());
            }
            Ok(empty_context())
        })
        .into_ref();
        nested(vec![form], vec![control]).unwrap();
        assert_eq!(*seen.borrow(), vec!["login"]);
    }

    #[test]
    fn should_share_one_instance_per_node() {
        let created = Rc::new(RefCell::new(0));
        let counter = created.clone();
        let service = DirectiveDef::directive("Service", |_| Ok(empty_context()))
            .with_providers(vec![Provider::factory("Counter", move |_| {
                *counter.borrow_mut() += 1;
                Ok(text("shared"))
            })])
            .into_ref();
        let seen = Seen::default();
        nested(
            vec![service],
            vec![probe("Counter", &seen), probe("Counter", &seen)],
        )
        .unwrap();
        assert_eq!(*seen.borrow(), vec!["shared", "shared"]);
        assert_eq!(*created.borrow(), 1);
    }

    #[test]
    fn should_fall_back_to_the_module_injector() {
        let seen = Seen::default();
        let probe = probe("Api", &seen);
        let def = DirectiveDef::component(
            "App",
            |_| Ok(empty_context()),
            move |ctx, flags, _| {
                if flags.contains(RenderFlags::CREATE) {
                    ctx.element_start_with(0, "div", &[], &[probe.clone()])?;
                    ctx.element_end()?;
                }
                Ok(())
            },
            1,
            0,
        )
        .into_ref();
        let platform: Rc<dyn Injector> = Rc::new(StaticInjector::new().provide("Api", text("api")));
        TemplateFixture::try_with_component(def, |ctx| {
            ctx.set_module_injector(Rc::new(StaticInjector::with_parent(platform)));
        })
        .unwrap();
        assert_eq!(*seen.borrow(), vec!["api"]);
    }

    #[test]
    fn should_report_missing_providers() {
        let seen = Seen::default();
        let err = nested(vec![], vec![probe("Missing", &seen)]).err().unwrap();
        assert_eq!(
            err,
            RuntimeError::NoProvider {
                token: "Missing".to_string()
            }
        );
    }

    #[test]
    fn should_detect_circular_providers() {
        let cyclic = DirectiveDef::directive("Cyclic", |ctx| ctx.directive_inject("A"))
            .with_providers(vec![
                Provider::factory("A", |ctx| ctx.directive_inject("B")),
                Provider::factory("B", |ctx| ctx.directive_inject("A")),
            ])
            .into_ref();
        let err = nested(vec![], vec![cyclic]).err().unwrap();
        assert_eq!(
            err,
            RuntimeError::CircularDependency {
                token: "A".to_string()
            }
        );
    }

    #[test]
    fn should_hide_view_providers_from_content_children() {
        let seen_inside = Seen::default();
        let seen_content = Seen::default();
        let list_probe = |seen: &Seen| {
            let seen = seen.clone();
            DirectiveDef::directive("PluginProbe", move |ctx| {
                let plugins = ctx.directive_inject("Plugins")?;
                let names = plugins
                    .downcast_ref::<Vec<Instance>>()
                    .map(|plugins| plugins.iter().map(as_text).collect::<Vec<_>>())
                    .unwrap_or_default();
                seen.borrow_mut().push(names.join(","));
                Ok(empty_context())
            })
            .into_ref()
        };

        let inside = list_probe(&seen_inside);
        let panel = DirectiveDef::component(
            "Panel",
            |_| Ok(empty_context()),
            move |ctx, flags, _| {
                if flags.contains(RenderFlags::CREATE) {
                    ctx.element_start_with(0, "inner", &[], &[inside.clone()])?;
                    ctx.element_end()?;
                }
                Ok(())
            },
            1,
            0,
        )
        .with_providers(vec![
            Provider::multi("Plugins", |_| Ok(text("p1"))),
            Provider::multi("Plugins", |_| Ok(text("p2"))),
        ])
        .with_view_providers(vec![Provider::multi("Plugins", |_| Ok(text("v1")))])
        .into_ref();

        let content = list_probe(&seen_content);
        TemplateFixture::new(2, 0, move |ctx, flags, _| {
            if flags.contains(RenderFlags::CREATE) {
                ctx.element_start_with(0, "panel", &[], &[panel.clone()])?;
                ctx.element_start_with(1, "content", &[], &[content.clone()])?;
                ctx.element_end()?;
                ctx.element_end()?;
            }
            Ok(())
        });
        assert_eq!(*seen_content.borrow(), vec!["p1,p2"]);
        assert_eq!(*seen_inside.borrow(), vec!["p1,p2,v1"]);
    }

    #[test]
    fn should_resolve_through_the_declaration_of_embedded_views() {
        let seen = Seen::default();
        let probe = probe("Config", &seen);
        let template: TemplateFn = Rc::new(
            move |ctx: &mut RenderContext, flags: RenderFlags, _: &Instance| -> Result<()> {
                if flags.contains(RenderFlags::CREATE) {
                    ctx.element_start_with(0, "input", &[], &[probe.clone()])?;
                    ctx.element_end()?;
                }
                Ok(())
            },
        );
        let outer = providing("Outer", "Config", "declared");
        let mut fixture = TemplateFixture::new(2, 0, move |ctx, flags, _| {
            if flags.contains(RenderFlags::CREATE) {
                ctx.element_start_with(0, "section", &[], &[outer.clone()])?;
                ctx.template(1, template.clone(), 1, 0, None, &[])?;
                ctx.element_end()?;
            }
            Ok(())
        });
        let vcr = ViewContainerRef {
            view: fixture.component.component_view,
            index: 1,
        };
        let anchor = vcr.anchor(&fixture.ctx).unwrap();
        let factory = fixture.ctx.get_embedded_view_factory(anchor).unwrap();
        vcr.create_embedded_view(&mut fixture.ctx, &factory, empty_context(), None)
            .unwrap();
        assert_eq!(*seen.borrow(), vec!["declared"]);
        assert_eq!(
            fixture.html(),
            "<section><!--container--><input></input></section>"
        );
    }

    #[test]
    fn should_let_structural_directives_stamp_their_template() {
        let stamp = DirectiveDef::directive("Stamp", |ctx| {
            let container = ctx.inject_view_container_ref()?;
            let template = ctx.inject_template_ref()?;
            container.create_embedded_view(ctx, &template, empty_context(), None)?;
            Ok(empty_context())
        })
        .into_ref();
        let content: TemplateFn = Rc::new(
            |ctx: &mut RenderContext, flags: RenderFlags, _: &Instance| -> Result<()> {
                if flags.contains(RenderFlags::CREATE) {
                    ctx.text(0, "yes")?;
                }
                Ok(())
            },
        );
        let fixture = TemplateFixture::new(1, 0, move |ctx, flags, _| {
            if flags.contains(RenderFlags::CREATE) {
                ctx.template_with(0, content.clone(), 1, 0, None, &[], &[stamp.clone()])?;
            }
            Ok(())
        });
        assert_eq!(fixture.html(), "<!--container-->yes");
    }
}
