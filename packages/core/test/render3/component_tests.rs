//! Component Tests
//!
//! Bootstrapping, change detection, lifecycle hook ordering, listeners and destruction.

#[path = "util/mod.rs"]
mod util;

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::util::{document_with_host, empty_context, TemplateFixture};
    use angular_core::render3::interfaces::definition::HookFn;
    use angular_core::render3::{
        CreateComponentOptions, DirectiveDef, DirectiveDefRef, Instance, LifecycleHooks,
        RenderContext, RenderFlags, RendererEvent,
    };
    use angular_core::{RuntimeConfig, RuntimeError};
    use serde_json::{json, Value};

    struct Counter {
        count: Cell<i32>,
    }

    fn counter_component() -> DirectiveDefRef {
        DirectiveDef::component(
            "Counter",
            |_| {
                Ok(Rc::new(Counter {
                    count: Cell::new(1),
                }) as Instance)
            },
            |ctx, flags, context| {
                if flags.contains(RenderFlags::CREATE) {
                    ctx.element_start(0, "span", &[])?;
                    ctx.text(1, "")?;
                    ctx.element_end()?;
                }
                if flags.contains(RenderFlags::UPDATE) {
                    let count = context
                        .downcast_ref::<Counter>()
                        .map(|counter| counter.count.get())
                        .unwrap_or_default();
                    ctx.text_binding(1, json!(count))?;
                }
                Ok(())
            },
            2,
            1,
        )
        .into_ref()
    }

    type Log = Rc<RefCell<Vec<String>>>;

    fn hook(log: &Log, entry: &str) -> Option<HookFn> {
        let log = log.clone();
        let entry = entry.to_string();
        let hook: HookFn = Rc::new(move |_: &Instance| log.borrow_mut().push(entry.clone()));
        Some(hook)
    }

    fn logging_hooks(log: &Log, name: &str) -> LifecycleHooks {
        LifecycleHooks {
            on_init: hook(log, &format!("{}:init", name)),
            after_content_init: hook(log, &format!("{}:content", name)),
            after_view_init: hook(log, &format!("{}:view", name)),
            after_view_checked: hook(log, &format!("{}:view-checked", name)),
            on_destroy: hook(log, &format!("{}:destroy", name)),
            ..Default::default()
        }
    }

    /// Parent component hosting one `<child>`, both logging their hooks.
    fn parent_with_child(log: &Log) -> DirectiveDefRef {
        let child = DirectiveDef::component(
            "Child",
            |_| Ok(empty_context()),
            |ctx, flags, _| {
                if flags.contains(RenderFlags::CREATE) {
                    ctx.text(0, "child")?;
                }
                Ok(())
            },
            1,
            0,
        )
        .with_hooks(logging_hooks(log, "child"))
        .into_ref();
        DirectiveDef::component(
            "Parent",
            |_| Ok(empty_context()),
            move |ctx, flags, _| {
                if flags.contains(RenderFlags::CREATE) {
                    ctx.element_start_with(0, "child", &[], &[child.clone()])?;
                    ctx.element_end()?;
                }
                Ok(())
            },
            1,
            0,
        )
        .with_hooks(logging_hooks(log, "parent"))
        .into_ref()
    }

    #[test]
    fn should_render_component_state() {
        let mut fixture = TemplateFixture::with_component(counter_component());
        assert_eq!(fixture.html(), "<span>1</span>");

        fixture
            .component
            .instance::<Counter>()
            .unwrap()
            .count
            .set(5);
        fixture.update();
        assert_eq!(fixture.html(), "<span>5</span>");
    }

    #[test]
    fn should_run_lifecycle_hooks_in_order() {
        let log: Log = Rc::default();
        let mut fixture = TemplateFixture::with_component(parent_with_child(&log));
        assert_eq!(fixture.html(), "<child>child</child>");
        assert_eq!(
            *log.borrow(),
            vec![
                "parent:init",
                "parent:content",
                "child:init",
                "child:content",
                "child:view",
                "child:view-checked",
                "parent:view",
                "parent:view-checked",
            ]
        );

        log.borrow_mut().clear();
        fixture.update();
        assert_eq!(
            *log.borrow(),
            vec!["child:view-checked", "parent:view-checked"]
        );
    }

    #[test]
    fn should_destroy_children_before_parents() {
        let log: Log = Rc::default();
        let mut fixture = TemplateFixture::with_component(parent_with_child(&log));
        log.borrow_mut().clear();

        let component = fixture.component.clone();
        component.destroy(&mut fixture.ctx).unwrap();
        assert_eq!(*log.borrow(), vec!["child:destroy", "parent:destroy"]);
        assert_eq!(fixture.html(), "");
        assert!(fixture.ctx.is_destroyed(component.component_view).unwrap());

        let err = fixture.try_update().unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidOperation(_)));
        // Destroying twice is a no-op.
        component.destroy(&mut fixture.ctx).unwrap();
    }

    #[test]
    fn should_listen_and_unlisten_on_destroy() {
        let clicks = Rc::new(Cell::new(0));
        let counter = clicks.clone();
        let mut fixture = TemplateFixture::new(1, 0, move |ctx, flags, _| {
            if flags.contains(RenderFlags::CREATE) {
                ctx.element_start(0, "button", &[])?;
                let counter = counter.clone();
                ctx.listener(
                    "click",
                    Rc::new(move |_: &RendererEvent| {
                        counter.set(counter.get() + 1);
                        true
                    }),
                )?;
                ctx.element_end()?;
                ctx.listener_global("window", "resize", Rc::new(|_: &RendererEvent| false))?;
            }
            Ok(())
        });
        let button = fixture.query("button");
        assert!(fixture.doc.dispatch_event(button, "click", Value::Null));
        assert_eq!(clicks.get(), 1);
        assert!(!fixture.doc.dispatch_global_event("window", "resize", Value::Null));
        assert_eq!(fixture.doc.listener_count(), 2);

        let component = fixture.component.clone();
        component.destroy(&mut fixture.ctx).unwrap();
        assert_eq!(fixture.doc.listener_count(), 0);
    }

    #[test]
    fn should_bind_properties_and_attributes() {
        let title = Rc::new(RefCell::new(json!("hello")));
        let state = title.clone();
        let mut fixture = TemplateFixture::new(1, 2, move |ctx, flags, _| {
            if flags.contains(RenderFlags::CREATE) {
                ctx.element(0, "input", &[("type", "text")])?;
            }
            if flags.contains(RenderFlags::UPDATE) {
                ctx.select(0)?;
                ctx.property("value", json!(42))?;
                ctx.attribute("title", state.borrow().clone())?;
            }
            Ok(())
        });
        let input = fixture.query("input");
        assert_eq!(fixture.doc.property(input, "value"), Some(json!(42)));
        assert_eq!(fixture.doc.attribute(input, "title"), Some("hello".to_string()));
        assert_eq!(fixture.doc.attribute(input, "type"), Some("text".to_string()));

        *title.borrow_mut() = Value::Null;
        fixture.update();
        assert_eq!(fixture.doc.attribute(input, "title"), None);
    }

    #[test]
    fn should_create_namespaced_elements() {
        let fixture = TemplateFixture::new(2, 0, |ctx, flags, _| {
            if flags.contains(RenderFlags::CREATE) {
                ctx.element_start(0, ":svg:svg", &[])?;
                ctx.element(1, ":svg:circle", &[("r", "4")])?;
                ctx.element_end()?;
            }
            Ok(())
        });
        let circle = fixture.query("circle");
        assert_eq!(fixture.doc.namespace(circle), Some("svg".to_string()));
        assert_eq!(fixture.html(), "<svg><circle r=\"4\"></circle></svg>");
    }

    #[test]
    fn should_fail_when_the_host_is_missing() {
        let (doc, _) = document_with_host();
        let mut ctx = RenderContext::new(Rc::new(doc), RuntimeConfig::with_dev_mode(true));
        let err = ctx
            .render_component(counter_component(), "#missing", CreateComponentOptions::default())
            .unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidOperation(_)));

        let directive = DirectiveDef::directive("Plain", |_| Ok(empty_context())).into_ref();
        let err = ctx
            .render_component(directive, "#host", CreateComponentOptions::default())
            .unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidOperation(_)));
    }

    #[test]
    fn should_reject_nodes_outside_the_declared_range() {
        let err = TemplateFixture::try_new(1, 0, |ctx, flags, _| {
            if flags.contains(RenderFlags::CREATE) {
                ctx.element(3, "div", &[])?;
            }
            Ok(())
        })
        .err()
        .unwrap();
        assert_eq!(err, RuntimeError::IndexMismatch { index: 3, expected: 0 });
    }

    #[test]
    fn should_reject_nodes_declared_out_of_order() {
        let err = TemplateFixture::try_new(3, 0, |ctx, flags, _| {
            if flags.contains(RenderFlags::CREATE) {
                ctx.element(0, "div", &[])?;
                ctx.element(2, "span", &[])?;
                ctx.element(1, "p", &[])?;
            }
            Ok(())
        })
        .err()
        .unwrap();
        assert_eq!(err, RuntimeError::IndexMismatch { index: 2, expected: 1 });
    }

    #[test]
    fn should_reject_unbalanced_end_instructions() {
        let err = TemplateFixture::try_new(1, 0, |ctx, flags, _| {
            if flags.contains(RenderFlags::CREATE) {
                ctx.element_end()?;
            }
            Ok(())
        })
        .err()
        .unwrap();
        assert!(matches!(err, RuntimeError::PhaseViolation(_)));
    }

    #[test]
    fn should_reject_two_components_on_one_node() {
        let first = counter_component();
        let second = DirectiveDef::component(
            "Other",
            |_| Ok(empty_context()),
            |_, _, _| Ok(()),
            0,
            0,
        )
        .into_ref();
        let err = TemplateFixture::try_new(1, 0, move |ctx, flags, _| {
            if flags.contains(RenderFlags::CREATE) {
                ctx.element_start_with(0, "x", &[], &[first.clone(), second.clone()])?;
                ctx.element_end()?;
            }
            Ok(())
        })
        .err()
        .unwrap();
        assert!(matches!(err, RuntimeError::InvalidOperation(_)));
    }

    #[test]
    fn should_not_promote_component_hosts_to_containers() {
        let log: Log = Rc::default();
        let mut fixture = TemplateFixture::with_component(parent_with_child(&log));
        let child_host = fixture.query("child");
        let err = fixture.ctx.get_view_container(child_host).unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidOperation(_)));
    }
}
