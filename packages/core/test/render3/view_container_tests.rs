//! View Container Tests
//!
//! Embedded views created from `<ng-template>`, inserted, moved and removed through a
//! `ViewContainerRef`, plus inline embedded view blocks.

#[path = "util/mod.rs"]
mod util;

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::util::{empty_context, TemplateFixture};
    use angular_core::render3::{
        EmbeddedViewFactory, Instance, RenderContext, RenderFlags, TemplateFn, ViewContainerRef,
        ViewId,
    };
    use angular_core::{Result, RuntimeError};

    /// Embedded template rendering its context string as a text node.
    fn label_template() -> TemplateFn {
        Rc::new(
            |ctx: &mut RenderContext, flags: RenderFlags, context: &Instance| -> Result<()> {
                if flags.contains(RenderFlags::CREATE) {
                    let label = context.downcast_ref::<String>().cloned().unwrap_or_default();
                    ctx.text(0, &label)?;
                }
                Ok(())
            },
        )
    }

    fn label(text: &str) -> Instance {
        Rc::new(text.to_string())
    }

    /// Component with a single `<ng-template>` at slot 0.
    fn template_fixture() -> (TemplateFixture, ViewContainerRef, EmbeddedViewFactory) {
        let fixture = TemplateFixture::new(1, 0, |ctx, flags, _| {
            if flags.contains(RenderFlags::CREATE) {
                ctx.template(0, label_template(), 1, 0, None, &[])?;
            }
            Ok(())
        });
        let vcr = ViewContainerRef {
            view: fixture.component.component_view,
            index: 0,
        };
        let anchor = vcr.anchor(&fixture.ctx).unwrap();
        let factory = fixture.ctx.get_embedded_view_factory(anchor).unwrap();
        (fixture, vcr, factory)
    }

    fn create(fixture: &mut TemplateFixture, factory: &EmbeddedViewFactory, text: &str) -> ViewId {
        fixture.ctx.create_embedded_view(factory, label(text)).unwrap()
    }

    #[test]
    fn should_insert_views_after_the_anchor_in_container_order() {
        let (mut fixture, vcr, factory) = template_fixture();
        let c = vcr
            .create_embedded_view(&mut fixture.ctx, &factory, label("C"), None)
            .unwrap();
        let a = vcr
            .create_embedded_view(&mut fixture.ctx, &factory, label("A"), Some(0))
            .unwrap();
        let b = create(&mut fixture, &factory, "B");
        vcr.insert_after(&mut fixture.ctx, b, Some(a)).unwrap();

        assert_eq!(fixture.html(), "<!--container-->ABC");
        assert_eq!(vcr.index_of(&fixture.ctx, b).unwrap(), Some(1));
        assert_eq!(vcr.get(&fixture.ctx, 2).unwrap(), Some(c));
        assert_eq!(vcr.length(&fixture.ctx).unwrap(), 3);
    }

    #[test]
    fn should_move_views() {
        let (mut fixture, vcr, factory) = template_fixture();
        let a = vcr.create_embedded_view(&mut fixture.ctx, &factory, label("A"), None).unwrap();
        vcr.create_embedded_view(&mut fixture.ctx, &factory, label("B"), None).unwrap();
        let c = vcr.create_embedded_view(&mut fixture.ctx, &factory, label("C"), None).unwrap();

        vcr.move_view(&mut fixture.ctx, c, 0).unwrap();
        assert_eq!(fixture.html(), "<!--container-->CAB");

        vcr.move_view(&mut fixture.ctx, a, 2).unwrap();
        assert_eq!(fixture.html(), "<!--container-->CBA");
        assert_eq!(vcr.index_of(&fixture.ctx, a).unwrap(), Some(2));
    }

    #[test]
    fn should_insert_after_a_later_view_when_moving_forward() {
        let (mut fixture, vcr, factory) = template_fixture();
        let a = vcr.create_embedded_view(&mut fixture.ctx, &factory, label("A"), None).unwrap();
        let b = vcr.create_embedded_view(&mut fixture.ctx, &factory, label("B"), None).unwrap();
        vcr.create_embedded_view(&mut fixture.ctx, &factory, label("C"), None).unwrap();

        vcr.insert_after(&mut fixture.ctx, a, Some(b)).unwrap();
        assert_eq!(fixture.html(), "<!--container-->BAC");
    }

    #[test]
    fn should_detach_and_reattach_views() {
        let (mut fixture, vcr, factory) = template_fixture();
        vcr.create_embedded_view(&mut fixture.ctx, &factory, label("A"), None).unwrap();
        vcr.create_embedded_view(&mut fixture.ctx, &factory, label("B"), None).unwrap();

        let detached = vcr.detach(&mut fixture.ctx, Some(0)).unwrap().unwrap();
        assert_eq!(fixture.html(), "<!--container-->B");
        assert!(!fixture.ctx.is_destroyed(detached).unwrap());

        vcr.append(&mut fixture.ctx, detached).unwrap();
        assert_eq!(fixture.html(), "<!--container-->BA");
    }

    #[test]
    fn should_remove_and_destroy_views() {
        let (mut fixture, vcr, factory) = template_fixture();
        let a = vcr.create_embedded_view(&mut fixture.ctx, &factory, label("A"), None).unwrap();
        vcr.create_embedded_view(&mut fixture.ctx, &factory, label("B"), None).unwrap();

        vcr.remove(&mut fixture.ctx, Some(0)).unwrap();
        assert_eq!(fixture.html(), "<!--container-->B");
        assert!(fixture.ctx.is_destroyed(a).unwrap());

        let err = vcr.insert(&mut fixture.ctx, a, None).unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidOperation(_)));

        vcr.clear(&mut fixture.ctx).unwrap();
        assert_eq!(fixture.html(), "<!--container-->");
        assert_eq!(vcr.length(&fixture.ctx).unwrap(), 0);
    }

    #[test]
    fn should_reuse_the_slots_of_destroyed_views() {
        let (mut fixture, vcr, factory) = template_fixture();
        let live = fixture.ctx.live_view_count();
        let first = vcr
            .create_embedded_view(&mut fixture.ctx, &factory, label("A"), None)
            .unwrap();
        let text = fixture.doc.children(fixture.host)[1];
        assert!(fixture.ctx.locate(text).is_some());
        vcr.remove(&mut fixture.ctx, None).unwrap();
        assert_eq!(fixture.ctx.live_view_count(), live);
        assert!(fixture.ctx.locate(text).is_none());

        for round in 0..1000 {
            let view = vcr
                .create_embedded_view(&mut fixture.ctx, &factory, label("B"), None)
                .unwrap();
            assert_eq!(view.index(), first.index());
            assert_eq!(view.generation(), round + 1);
            vcr.remove(&mut fixture.ctx, None).unwrap();
        }
        assert_eq!(fixture.ctx.live_view_count(), live);
        assert_eq!(fixture.html(), "<!--container-->");

        // Stale handles read as destroyed and no longer reach a view.
        assert!(fixture.ctx.is_destroyed(first).unwrap());
        assert_eq!(
            fixture.ctx.view(first).err(),
            Some(RuntimeError::UnknownView(first.index()))
        );
    }

    #[test]
    fn should_reject_out_of_range_inserts_without_touching_the_dom() {
        let (mut fixture, vcr, factory) = template_fixture();
        vcr.create_embedded_view(&mut fixture.ctx, &factory, label("A"), None).unwrap();
        let b = create(&mut fixture, &factory, "B");

        let err = vcr.insert(&mut fixture.ctx, b, Some(5)).unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidOperation(_)));
        assert_eq!(fixture.html(), "<!--container-->A");
        assert_eq!(vcr.length(&fixture.ctx).unwrap(), 1);
    }

    #[test]
    fn should_promote_elements_to_view_containers() {
        let mut fixture = TemplateFixture::new(2, 0, |ctx, flags, _| {
            if flags.contains(RenderFlags::CREATE) {
                ctx.element(0, "span", &[])?;
                ctx.template(1, label_template(), 1, 0, None, &[])?;
            }
            Ok(())
        });
        let span = fixture.query("span");
        let vcr = fixture.ctx.get_view_container(span).unwrap();
        assert_eq!(vcr.index, 0);

        let template_anchor = ViewContainerRef {
            view: fixture.component.component_view,
            index: 1,
        }
        .anchor(&fixture.ctx)
        .unwrap();
        let factory = fixture.ctx.get_embedded_view_factory(template_anchor).unwrap();
        vcr.create_embedded_view(&mut fixture.ctx, &factory, label("X"), None)
            .unwrap();
        assert_eq!(
            fixture.html(),
            "<span></span><!--container-->X<!--container-->"
        );

        // Promoting twice returns the same container.
        assert_eq!(fixture.ctx.get_view_container(span).unwrap(), vcr);
        assert!(fixture.ctx.get_embedded_view_factory(span).is_err());
    }

    #[test]
    fn should_remove_views_holding_promoted_element_containers() {
        let group: TemplateFn = Rc::new(
            |ctx: &mut RenderContext, flags: RenderFlags, _: &Instance| -> Result<()> {
                if flags.contains(RenderFlags::CREATE) {
                    ctx.element_container_start(0, &[])?;
                    ctx.element_container_end()?;
                }
                Ok(())
            },
        );
        let mut fixture = TemplateFixture::new(2, 0, move |ctx, flags, _| {
            if flags.contains(RenderFlags::CREATE) {
                ctx.template(0, group.clone(), 1, 0, None, &[])?;
                ctx.template(1, label_template(), 1, 0, None, &[])?;
            }
            Ok(())
        });
        let view = fixture.component.component_view;
        let outer = ViewContainerRef { view, index: 0 };
        let labels = ViewContainerRef { view, index: 1 };
        let group_factory = fixture
            .ctx
            .get_embedded_view_factory(outer.anchor(&fixture.ctx).unwrap())
            .unwrap();
        let label_factory = fixture
            .ctx
            .get_embedded_view_factory(labels.anchor(&fixture.ctx).unwrap())
            .unwrap();

        let group_view = outer
            .create_embedded_view(&mut fixture.ctx, &group_factory, empty_context(), None)
            .unwrap();
        let ng_container = fixture.doc.children(fixture.host)[1];
        let inner = fixture.ctx.get_view_container(ng_container).unwrap();
        inner
            .create_embedded_view(&mut fixture.ctx, &label_factory, label("X"), None)
            .unwrap();
        assert_eq!(
            fixture.html(),
            "<!--container--><!--ng-container--><!--container-->X<!--container-->"
        );

        outer.detach(&mut fixture.ctx, None).unwrap();
        assert_eq!(fixture.html(), "<!--container--><!--container-->");

        outer.insert(&mut fixture.ctx, group_view, None).unwrap();
        assert_eq!(
            fixture.html(),
            "<!--container--><!--ng-container--><!--container-->X<!--container-->"
        );

        outer.remove(&mut fixture.ctx, None).unwrap();
        assert_eq!(fixture.html(), "<!--container--><!--container-->");
    }

    #[test]
    fn should_refresh_views_inserted_in_containers() {
        let count = Rc::new(Cell::new(0));
        let counter = count.clone();
        let template: TemplateFn = Rc::new(
            move |ctx: &mut RenderContext, flags: RenderFlags, _: &Instance| -> Result<()> {
                if flags.contains(RenderFlags::CREATE) {
                    ctx.text(0, "")?;
                }
                if flags.contains(RenderFlags::UPDATE) {
                    ctx.text_binding(0, counter.get().into())?;
                }
                Ok(())
            },
        );
        let mut fixture = TemplateFixture::new(1, 0, move |ctx, flags, _| {
            if flags.contains(RenderFlags::CREATE) {
                ctx.template(0, template.clone(), 1, 1, None, &[])?;
            }
            Ok(())
        });
        let vcr = ViewContainerRef {
            view: fixture.component.component_view,
            index: 0,
        };
        let anchor = vcr.anchor(&fixture.ctx).unwrap();
        let factory = fixture.ctx.get_embedded_view_factory(anchor).unwrap();
        vcr.create_embedded_view(&mut fixture.ctx, &factory, empty_context(), None)
            .unwrap();

        count.set(7);
        fixture.update();
        assert_eq!(fixture.html(), "<!--container-->7");
    }

    #[test]
    fn should_create_and_remove_inline_views() {
        let show = Rc::new(Cell::new(true));
        let state = show.clone();
        let mut fixture = TemplateFixture::new(1, 0, move |ctx, flags, _| {
            if flags.contains(RenderFlags::CREATE) {
                ctx.container(0)?;
            }
            if flags.contains(RenderFlags::UPDATE) {
                ctx.container_refresh_start(0)?;
                if state.get() {
                    let block_flags = ctx.embedded_view_start(0, 1, 0)?;
                    if block_flags.contains(RenderFlags::CREATE) {
                        ctx.text(0, "shown")?;
                    }
                    ctx.embedded_view_end()?;
                }
                ctx.container_refresh_end()?;
            }
            Ok(())
        });
        assert_eq!(fixture.html(), "<!--container-->shown");

        show.set(false);
        fixture.update();
        assert_eq!(fixture.html(), "<!--container-->");

        show.set(true);
        fixture.update();
        assert_eq!(fixture.html(), "<!--container-->shown");
    }

    #[test]
    fn should_reuse_inline_views_of_the_same_block() {
        let branch = Rc::new(Cell::new(0usize));
        let state = branch.clone();
        let mut fixture = TemplateFixture::new(1, 0, move |ctx, flags, _| {
            if flags.contains(RenderFlags::CREATE) {
                ctx.container(0)?;
            }
            if flags.contains(RenderFlags::UPDATE) {
                ctx.container_refresh_start(0)?;
                let block = state.get();
                let block_flags = ctx.embedded_view_start(block, 1, 0)?;
                if block_flags.contains(RenderFlags::CREATE) {
                    ctx.text(0, if block == 0 { "first" } else { "second" })?;
                }
                ctx.embedded_view_end()?;
                ctx.container_refresh_end()?;
            }
            Ok(())
        });
        let vcr = ViewContainerRef {
            view: fixture.component.component_view,
            index: 0,
        };
        let first = vcr.get(&fixture.ctx, 0).unwrap().unwrap();
        fixture.update();
        assert_eq!(vcr.get(&fixture.ctx, 0).unwrap(), Some(first));

        branch.set(1);
        fixture.update();
        assert_eq!(fixture.html(), "<!--container-->second");
        assert!(fixture.ctx.is_destroyed(first).unwrap());
    }
}
