//! Timeline widget for WebAssembly hosts.

mod host;
#[cfg(target_arch = "wasm32")]
mod styles;

pub use host::{CaptureOutcome, HostEvent, PositionChange, SizeChange};

#[cfg(target_arch = "wasm32")]
mod wasm_ui {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use crate::host::{CaptureOutcome, HostEvent, PositionChange, SizeChange};
    use crate::styles;
    use chrono::{DateTime, Utc};
    use kurbo::{Point, Rect};
    use serde::Serialize;
    use serde_wasm_bindgen::from_value;
    use timeline_core::{
        capture_positions, rebase_deltas, CaptureScheduler, CaptureTicket, ContainerGeometry,
        CustomYDelta, DateLabelPosition, GestureController, GestureEvent, ItemSize, LabelSide,
        LayoutConfig, LayoutRequest, MeasuredItem, RenderPosition, ResolvedItem, ScaleMarker,
        TimelineError, TimelineLayout, CAPTURE_DELAY_MS,
    };
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;
    use web_sys::{console, Document, DomRect, Element, PointerEvent, Window};
    use yew::prelude::*;
    use yew::AppHandle;

    #[derive(Properties, PartialEq)]
    pub struct TimelineViewProps {
        pub request: LayoutRequest,
        #[prop_or_default]
        pub config: LayoutConfig,
        /// Fired on every drag move and once more, with the offset to store,
        /// when the drag ends.
        #[prop_or_default]
        pub on_position_change: Callback<PositionChange>,
        #[prop_or_default]
        pub on_size_change: Callback<SizeChange>,
        #[prop_or_default]
        pub on_capture_complete: Callback<CaptureOutcome>,
    }

    /// Window listeners for one gesture. Dropping the guard unregisters them.
    struct GestureListeners {
        window: Window,
        on_move: Closure<dyn FnMut(PointerEvent)>,
        on_up: Closure<dyn FnMut(PointerEvent)>,
    }

    impl GestureListeners {
        fn attach(
            window: &Window,
            on_move: Closure<dyn FnMut(PointerEvent)>,
            on_up: Closure<dyn FnMut(PointerEvent)>,
        ) -> Result<Self, JsValue> {
            let guard = Self {
                window: window.clone(),
                on_move,
                on_up,
            };
            guard.window.add_event_listener_with_callback(
                "pointermove",
                guard.on_move.as_ref().unchecked_ref(),
            )?;
            for kind in ["pointerup", "pointercancel"] {
                guard
                    .window
                    .add_event_listener_with_callback(kind, guard.on_up.as_ref().unchecked_ref())?;
            }
            Ok(guard)
        }

        /// Stop observing the pointer. The closures stay alive until the
        /// guard is dropped, since `detach` may run from inside `on_up`.
        fn detach(&self) {
            let _ = self.window.remove_event_listener_with_callback(
                "pointermove",
                self.on_move.as_ref().unchecked_ref(),
            );
            for kind in ["pointerup", "pointercancel"] {
                let _ = self
                    .window
                    .remove_event_listener_with_callback(kind, self.on_up.as_ref().unchecked_ref());
            }
        }
    }

    impl Drop for GestureListeners {
        fn drop(&mut self) {
            self.detach();
        }
    }

    #[derive(Clone)]
    struct GestureContext {
        controller: Rc<RefCell<GestureController>>,
        container: NodeRef,
        axis: NodeRef,
        live_positions: Rc<RefCell<HashMap<String, RenderPosition>>>,
        sizes: Rc<RefCell<HashMap<String, ItemSize>>>,
        /// Default Y of every rendered item, for offsets of finished drags.
        defaults: Rc<RefCell<HashMap<String, f64>>>,
        deltas: Rc<RefCell<CustomYDelta>>,
        listeners: Rc<RefCell<Option<GestureListeners>>>,
        redraw: UseForceUpdateHandle,
        on_position_change: Callback<PositionChange>,
        on_size_change: Callback<SizeChange>,
    }

    impl GestureContext {
        fn listen(&self) {
            let Some(window) = web_sys::window() else {
                console::error_1(&JsValue::from_str("No window to track the pointer"));
                self.controller.borrow_mut().cancel();
                return;
            };

            let on_move = {
                let ctx = self.clone();
                Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
                    ctx.pointer_move(&event)
                })
            };
            let on_up = {
                let ctx = self.clone();
                Closure::<dyn FnMut(PointerEvent)>::new(move |_: PointerEvent| ctx.pointer_up())
            };

            match GestureListeners::attach(&window, on_move, on_up) {
                Ok(guard) => *self.listeners.borrow_mut() = Some(guard),
                Err(err) => {
                    console::error_1(&err);
                    self.controller.borrow_mut().cancel();
                }
            }
        }

        fn pointer_move(&self, event: &PointerEvent) {
            let geometry = container_geometry(&self.container, &self.axis);
            let result = self
                .controller
                .borrow_mut()
                .pointer_move(pointer_of(event), geometry.as_ref());
            match result {
                Ok(update) => self.apply(update),
                Err(TimelineError::MissingContainer) => console::warn_1(&JsValue::from_str(
                    "Timeline container not found, keeping last position",
                )),
                Err(_) => {}
            }
        }

        fn pointer_up(&self) {
            let result = self.controller.borrow_mut().pointer_up();
            if let Some(active) = self.listeners.borrow().as_ref() {
                active.detach();
            }
            if let Ok(update) = result {
                self.apply(update);
            }
        }

        fn apply(&self, update: GestureEvent) {
            let phase = update.phase();
            match &update {
                GestureEvent::PositionChanged { id, position, .. } => {
                    let default_y = self.defaults.borrow().get(id).copied();
                    let delta = default_y.and_then(|default_y| {
                        update.commit_offset(default_y, &mut self.deltas.borrow_mut())
                    });
                    self.live_positions
                        .borrow_mut()
                        .insert(id.clone(), *position);
                    self.on_position_change.emit(PositionChange {
                        id: id.clone(),
                        position: *position,
                        phase,
                        delta,
                    });
                }
                GestureEvent::SizeChanged { id, size, .. } => {
                    self.sizes.borrow_mut().insert(id.clone(), *size);
                    self.on_size_change.emit(SizeChange {
                        id: id.clone(),
                        size: *size,
                        phase,
                    });
                }
            }
            self.redraw.force_update();
        }
    }

    struct CaptureContext {
        scheduler: Rc<RefCell<CaptureScheduler>>,
        pins: Rc<RefCell<HashMap<String, f64>>>,
        container: NodeRef,
        axis: NodeRef,
        items: Vec<ResolvedItem>,
        deltas: CustomYDelta,
        config: LayoutConfig,
        on_complete: Callback<CaptureOutcome>,
    }

    /// An armed capture timer. Dropping it cancels the capture.
    struct PendingCapture {
        window: Window,
        handle: i32,
        scheduler: Rc<RefCell<CaptureScheduler>>,
        _callback: Closure<dyn FnMut()>,
    }

    impl Drop for PendingCapture {
        fn drop(&mut self) {
            self.scheduler.borrow_mut().cancel();
            self.window.clear_timeout_with_handle(self.handle);
        }
    }

    fn schedule_capture(ctx: CaptureContext) -> Option<PendingCapture> {
        if ctx.pins.borrow().is_empty() {
            return None;
        }
        let window = web_sys::window()?;
        let scheduler = ctx.scheduler.clone();
        let ticket = scheduler.borrow_mut().schedule();
        let callback = Closure::once(move || run_capture(&ctx, ticket));

        match window.set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            CAPTURE_DELAY_MS as i32,
        ) {
            Ok(handle) => Some(PendingCapture {
                window,
                handle,
                scheduler,
                _callback: callback,
            }),
            Err(err) => {
                console::error_1(&err);
                scheduler.borrow_mut().cancel();
                None
            }
        }
    }

    fn run_capture(ctx: &CaptureContext, ticket: CaptureTicket) {
        if !ctx.scheduler.borrow_mut().fire(ticket) {
            return;
        }
        let (Some(container), Some(axis)) =
            (ctx.container.cast::<Element>(), ctx.axis.cast::<Element>())
        else {
            console::warn_1(&JsValue::from_str("Timeline container not found, capture skipped"));
            return;
        };

        let measured = match measure_items(&container) {
            Ok(measured) => measured,
            Err(err) => {
                console::error_1(&err);
                return;
            }
        };
        let positions = capture_positions(
            &measured,
            to_rect(&axis.get_bounding_client_rect()),
            to_rect(&container.get_bounding_client_rect()),
            &ctx.config,
        );
        let custom_y_delta = rebase_deltas(&positions, &ctx.items, &ctx.deltas);
        ctx.pins.borrow_mut().clear();
        ctx.on_complete.emit(CaptureOutcome {
            positions,
            custom_y_delta,
        });
    }

    fn measure_items(container: &Element) -> Result<Vec<MeasuredItem>, JsValue> {
        let nodes = container.query_selector_all("[data-item-id]")?;
        let mut measured = Vec::with_capacity(nodes.length() as usize);
        for index in 0..nodes.length() {
            let Some(element) = nodes
                .item(index)
                .and_then(|node| node.dyn_into::<Element>().ok())
            else {
                continue;
            };
            let Some(id) = element.get_attribute("data-item-id") else {
                continue;
            };
            measured.push(MeasuredItem {
                id,
                rect: to_rect(&element.get_bounding_client_rect()),
            });
        }
        Ok(measured)
    }

    fn container_geometry(container: &NodeRef, axis: &NodeRef) -> Option<ContainerGeometry> {
        let container = container.cast::<Element>()?;
        let axis = axis.cast::<Element>()?;
        if !container.is_connected() {
            return None;
        }
        let bounds = container.get_bounding_client_rect();
        let axis_top = axis.get_bounding_client_rect().top();
        Some(ContainerGeometry::new(
            bounds.width(),
            bounds.height(),
            axis_top - bounds.top(),
        ))
    }

    fn to_rect(rect: &DomRect) -> Rect {
        Rect::new(rect.left(), rect.top(), rect.right(), rect.bottom())
    }

    fn pointer_of(event: &PointerEvent) -> Point {
        Point::new(f64::from(event.client_x()), f64::from(event.client_y()))
    }

    #[function_component(TimelineView)]
    fn timeline_view(props: &TimelineViewProps) -> Html {
        use_effect_with((), |_| {
            if let Some(window) = web_sys::window() {
                if let Some(document) = window.document() {
                    if let Err(err) = styles::ensure_styles(&document) {
                        console::error_1(&err);
                    }
                }
            }
            || ()
        });

        let settings = &props.request.settings;
        let mode = settings.position_mode;

        let container_ref = use_node_ref();
        let axis_ref = use_node_ref();
        let redraw = use_force_update();
        let controller = use_mut_ref(|| GestureController::new(mode, props.config.clone()));
        let live_positions = use_mut_ref(HashMap::<String, RenderPosition>::new);
        let sizes = use_mut_ref(HashMap::<String, ItemSize>::new);
        let defaults = use_mut_ref(HashMap::<String, f64>::new);
        let deltas = use_mut_ref(|| props.request.custom_y_delta.clone());
        let listeners = use_mut_ref(|| None::<GestureListeners>);
        let scheduler = use_mut_ref(CaptureScheduler::new);
        let pins = use_mut_ref(HashMap::<String, f64>::new);
        let rendered = use_mut_ref(HashMap::<String, f64>::new);
        let last_mode = use_mut_ref(|| None);

        controller.borrow_mut().set_mode(mode);

        let layout = use_memo(
            (props.request.clone(), props.config.clone()),
            |(request, config)| TimelineLayout::build(request, config),
        );

        // Custom items hold their on-screen spot across a mode switch until
        // the capture pass has rebased their offsets.
        {
            let mut last = last_mode.borrow_mut();
            if matches!(*last, Some(previous) if previous != mode) {
                *pins.borrow_mut() = rendered.borrow().clone();
            }
            *last = Some(mode);
        }

        *defaults.borrow_mut() = layout
            .items
            .iter()
            .map(|item| (item.id.clone(), item.default_position.y))
            .collect();

        {
            let live_positions = live_positions.clone();
            let controller = controller.clone();
            let deltas = deltas.clone();
            use_effect_with(props.request.clone(), move |request| {
                let active = controller.borrow().active_item().map(str::to_string);
                live_positions
                    .borrow_mut()
                    .retain(|id, _| active.as_deref() == Some(id.as_str()));
                *deltas.borrow_mut() = request.custom_y_delta.clone();
                || ()
            });
        }

        {
            let listeners = listeners.clone();
            use_effect_with((), move |_| {
                move || {
                    listeners.borrow_mut().take();
                }
            });
        }

        {
            let ctx = CaptureContext {
                scheduler,
                pins: pins.clone(),
                container: container_ref.clone(),
                axis: axis_ref.clone(),
                items: layout.items.clone(),
                deltas: props.request.custom_y_delta.clone(),
                config: props.config.clone(),
                on_complete: props.on_capture_complete.clone(),
            };
            // Any new request or config replaces the pending capture, so it
            // never rebases against items or offsets the host has moved past.
            use_effect_with(
                (mode, props.request.clone(), props.config.clone()),
                move |_| {
                    let pending = schedule_capture(ctx);
                    move || drop(pending)
                },
            );
        }

        let gestures = GestureContext {
            controller: controller.clone(),
            container: container_ref.clone(),
            axis: axis_ref.clone(),
            live_positions: live_positions.clone(),
            sizes: sizes.clone(),
            defaults,
            deltas,
            listeners,
            redraw,
            on_position_change: props.on_position_change.clone(),
            on_size_change: props.on_size_change.clone(),
        };

        let active = controller.borrow().active_item().map(str::to_string);
        let live = live_positions.borrow();
        let pinned = pins.borrow();
        let size_map = sizes.borrow();
        let mut displayed = HashMap::new();

        let items: Vec<Html> = layout
            .items
            .iter()
            .map(|item| {
                let position = live.get(&item.id).copied().unwrap_or_else(|| {
                    let y = pinned
                        .get(&item.id)
                        .copied()
                        .unwrap_or(item.render_position.y);
                    RenderPosition::new(item.render_position.x, y)
                });
                if item.is_custom_position {
                    displayed.insert(item.id.clone(), position.y);
                }
                let size = size_map.get(&item.id).copied().unwrap_or_default();
                let dragging = active.as_deref() == Some(item.id.as_str());
                render_item(
                    item,
                    position,
                    size,
                    dragging,
                    settings.date_label_position,
                    &gestures,
                )
            })
            .collect();
        *rendered.borrow_mut() = displayed;

        html! {
            <div class="timeline-widget" ref={container_ref}>
                <div class="timeline-axis" ref={axis_ref}></div>
                { for layout.markers.iter().map(render_marker) }
                {
                    if items.is_empty() {
                        html! { <div class="timeline-empty">{"No items to show yet."}</div> }
                    } else {
                        html! { for items }
                    }
                }
            </div>
        }
    }

    fn render_item(
        item: &ResolvedItem,
        position: RenderPosition,
        size: ItemSize,
        dragging: bool,
        label_position: DateLabelPosition,
        gestures: &GestureContext,
    ) -> Html {
        let style = format!(
            "left: {:.3}%; top: calc(50% + {:.1}px); width: {:.0}px; height: {:.0}px;",
            position.x, position.y, size.width, size.height
        );
        let label = match label_position {
            DateLabelPosition::Top => "top",
            DateLabelPosition::Bottom => "bottom",
        };

        let on_drag = {
            let ctx = gestures.clone();
            let id = item.id.clone();
            Callback::from(move |event: PointerEvent| {
                let started = ctx.controller.borrow_mut().begin_drag(
                    id.clone(),
                    event.button(),
                    pointer_of(&event),
                    position,
                    size,
                );
                if started.is_ok() {
                    event.prevent_default();
                    ctx.listen();
                }
            })
        };

        let on_resize = {
            let ctx = gestures.clone();
            let id = item.id.clone();
            Callback::from(move |event: PointerEvent| {
                event.stop_propagation();
                let started = ctx.controller.borrow_mut().begin_resize(
                    id.clone(),
                    event.button(),
                    pointer_of(&event),
                    size,
                );
                if started.is_ok() {
                    event.prevent_default();
                    ctx.listen();
                }
            })
        };

        html! {
            <div
                class={classes!(
                    "timeline-item",
                    dragging.then_some("is-dragging"),
                    item.is_custom_position.then_some("is-custom")
                )}
                data-item-id={item.id.clone()}
                data-label={label}
                style={style}
                onpointerdown={on_drag}
            >
                <span class="timeline-item-name">{ display_name(item) }</span>
                <span class="timeline-item-date">{ format_date(item.date) }</span>
                <span class="timeline-resize-handle" onpointerdown={on_resize}></span>
            </div>
        }
    }

    fn render_marker(marker: &ScaleMarker) -> Html {
        let side = match marker.label_side {
            LabelSide::Above => "above",
            LabelSide::Below => "below",
        };
        html! {
            <div
                class="timeline-marker"
                data-side={side}
                style={format!("left: {:.3}%; top: 50%;", marker.position)}
            >
                <span class="timeline-marker-label">{ marker.label.clone() }</span>
            </div>
        }
    }

    fn display_name(item: &ResolvedItem) -> String {
        if item.name.trim().is_empty() {
            format!("Item {}", item.id)
        } else {
            item.name.clone()
        }
    }

    fn format_date(date: Option<DateTime<Utc>>) -> String {
        date.map(|dt| dt.format("%b %d, %Y").to_string())
            .unwrap_or_else(|| "No date".to_string())
    }

    fn forward_to_host(handler: Option<js_sys::Function>) -> Callback<HostEvent> {
        Callback::from(move |event: HostEvent| {
            let Some(handler) = handler.as_ref() else {
                return;
            };
            match event.serialize(&serde_wasm_bindgen::Serializer::json_compatible()) {
                Ok(payload) => {
                    if let Err(err) = handler.call1(&JsValue::NULL, &payload) {
                        console::error_1(&err);
                    }
                }
                Err(err) => console::error_1(&JsValue::from_str(&format!(
                    "Could not serialize timeline event: {err}"
                ))),
            }
        })
    }

    fn host_props(request: LayoutRequest, forward: &Callback<HostEvent>) -> TimelineViewProps {
        TimelineViewProps {
            request,
            config: LayoutConfig::default(),
            on_position_change: forward.reform(HostEvent::from),
            on_size_change: forward.reform(HostEvent::from),
            on_capture_complete: forward.reform(HostEvent::from),
        }
    }

    /// A mounted timeline. Hosts push new requests (settings, items, stored
    /// offsets) through `update` and tear the view down with `unmount`.
    #[wasm_bindgen]
    pub struct TimelineHandle {
        app: Option<AppHandle<TimelineView>>,
        forward: Callback<HostEvent>,
    }

    #[wasm_bindgen]
    impl TimelineHandle {
        pub fn update(&mut self, request: JsValue) -> Result<(), JsValue> {
            let request: LayoutRequest = from_value(request)?;
            let app = self
                .app
                .as_mut()
                .ok_or_else(|| JsValue::from_str("Timeline view is already unmounted"))?;
            app.update(host_props(request, &self.forward));
            Ok(())
        }

        pub fn unmount(&mut self) {
            if let Some(app) = self.app.take() {
                app.destroy();
            }
        }
    }

    #[wasm_bindgen]
    pub fn mount_timeline_view(
        selector: &str,
        request: JsValue,
        on_event: Option<js_sys::Function>,
    ) -> Result<TimelineHandle, JsValue> {
        let window: Window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
        let document: Document = window
            .document()
            .ok_or_else(|| JsValue::from_str("Could not access document"))?;

        let target: Element = document
            .query_selector(selector)
            .map_err(|err| JsValue::from_str(&format!("Invalid selector: {err:?}")))?
            .ok_or_else(|| JsValue::from_str("No element matches the selector"))?;

        let request: LayoutRequest = from_value(request)?;
        let forward = forward_to_host(on_event);
        let app = yew::Renderer::<TimelineView>::with_root_and_props(
            target,
            host_props(request, &forward),
        )
        .render();

        Ok(TimelineHandle {
            app: Some(app),
            forward,
        })
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_ui::{mount_timeline_view, TimelineHandle};

#[cfg(not(target_arch = "wasm32"))]
pub fn mount_timeline_view(
    _: &str,
    _: wasm_bindgen::JsValue,
    _: Option<js_sys::Function>,
) -> Result<(), wasm_bindgen::JsValue> {
    Err(wasm_bindgen::JsValue::from_str(
        "timeline-ui only supports the wasm32 target",
    ))
}
