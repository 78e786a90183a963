#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use crate::config::ManagerConfig;
    use crate::core::errors::{CoreError, Result};
    use crate::core::toplevel::{
        BindingId, GlobalBinding, Manager, OutputId, ToplevelBinding, ToplevelId, ToplevelRequest,
        ToplevelState,
    };

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Toplevel,
        Title(String),
        AppId(String),
        State(ToplevelState),
        Enter(OutputId),
        Leave(OutputId),
        Parent(Option<ToplevelId>),
        Done,
        Closed,
        Finished,
    }

    /// A fake client connection recording everything sent to it.
    #[derive(Clone)]
    struct MockClient {
        id: u32,
        log: Rc<RefCell<Vec<(Option<ToplevelId>, Event)>>>,
        connected: Rc<Cell<bool>>,
        created: Rc<RefCell<Vec<MockToplevel>>>,
        unbound_outputs: Rc<RefCell<Vec<OutputId>>>,
    }

    impl MockClient {
        fn new(id: u32) -> Self {
            Self {
                id,
                log: Rc::default(),
                connected: Rc::new(Cell::new(true)),
                created: Rc::default(),
                unbound_outputs: Rc::default(),
            }
        }

        fn global(&self) -> MockGlobal {
            MockGlobal {
                client: self.clone(),
                alive: Rc::new(Cell::new(true)),
                fail: false,
            }
        }

        /// A toplevel binding created outside of global advertisement.
        fn toplevel(&self, toplevel: ToplevelId) -> MockToplevel {
            let binding = MockToplevel {
                client: self.clone(),
                toplevel,
                alive: Rc::new(Cell::new(true)),
            };
            self.created.borrow_mut().push(binding.clone());
            binding
        }

        fn record(&self, toplevel: Option<ToplevelId>, event: Event) {
            self.log.borrow_mut().push((toplevel, event));
        }

        fn events(&self, toplevel: ToplevelId) -> Vec<Event> {
            self.log
                .borrow()
                .iter()
                .filter(|(t, _)| *t == Some(toplevel))
                .map(|(_, e)| e.clone())
                .collect()
        }

        fn all(&self) -> Vec<(Option<ToplevelId>, Event)> {
            self.log.borrow().clone()
        }

        fn clear(&self) {
            self.log.borrow_mut().clear();
        }

        fn binding(&self, toplevel: ToplevelId) -> MockToplevel {
            self.created
                .borrow()
                .iter()
                .find(|b| b.toplevel == toplevel)
                .cloned()
                .expect("client has no binding for toplevel")
        }

        fn disconnect(&self) {
            self.connected.set(false);
        }
    }

    #[derive(Clone)]
    struct MockToplevel {
        client: MockClient,
        toplevel: ToplevelId,
        alive: Rc<Cell<bool>>,
    }

    impl MockToplevel {
        fn destroy(&self) {
            self.alive.set(false);
        }
    }

    impl ToplevelBinding for MockToplevel {
        fn is_alive(&self) -> bool {
            self.alive.get() && self.client.connected.get()
        }

        fn same_client(&self, other: &Self) -> bool {
            self.client.id == other.client.id
        }

        fn send_title(&self, title: &str) {
            self.client.record(Some(self.toplevel), Event::Title(title.to_string()));
        }

        fn send_app_id(&self, app_id: &str) {
            self.client.record(Some(self.toplevel), Event::AppId(app_id.to_string()));
        }

        fn send_state(&self, state: ToplevelState) {
            self.client.record(Some(self.toplevel), Event::State(state));
        }

        fn send_output_enter(&self, output: OutputId) -> bool {
            if self.client.unbound_outputs.borrow().contains(&output) {
                return false;
            }
            self.client.record(Some(self.toplevel), Event::Enter(output));
            true
        }

        fn send_output_leave(&self, output: OutputId) -> bool {
            self.client.record(Some(self.toplevel), Event::Leave(output));
            true
        }

        fn send_parent(&self, parent: Option<&Self>) {
            self.client.record(Some(self.toplevel), Event::Parent(parent.map(|p| p.toplevel)));
        }

        fn send_done(&self) {
            self.client.record(Some(self.toplevel), Event::Done);
        }

        fn send_closed(&self) {
            self.client.record(Some(self.toplevel), Event::Closed);
        }
    }

    struct MockGlobal {
        client: MockClient,
        alive: Rc<Cell<bool>>,
        fail: bool,
    }

    impl GlobalBinding for MockGlobal {
        type Toplevel = MockToplevel;
        type Seat = &'static str;
        type Surface = u32;

        fn is_alive(&self) -> bool {
            self.alive.get() && self.client.connected.get()
        }

        fn advertise(&self, toplevel: ToplevelId, _binding: BindingId) -> Result<MockToplevel> {
            if self.fail {
                return Err(CoreError::binding_failed(toplevel, "out of memory"));
            }
            self.client.record(Some(toplevel), Event::Toplevel);
            Ok(self.client.toplevel(toplevel))
        }

        fn send_finished(&self) {
            self.client.record(None, Event::Finished);
        }
    }

    type TestManager = Manager<MockGlobal>;

    const O1: OutputId = OutputId(1);
    const O2: OutputId = OutputId(2);
    const O3: OutputId = OutputId(3);

    // =========================================================================
    // Advertisement and initial state
    // =========================================================================

    #[test]
    fn test_new_toplevel_is_advertised() {
        let mut manager = TestManager::default();
        let client = MockClient::new(1);
        manager.bind_global(client.global());

        let handle = manager.create_handle();
        assert_eq!(
            client.events(handle.id()),
            vec![Event::Toplevel, Event::State(ToplevelState::empty()), Event::Done]
        );
        assert_eq!(manager.binding_count(handle.id()), 1);
        assert_eq!(manager.toplevels().collect::<Vec<_>>(), vec![handle.id()]);
    }

    #[test]
    fn test_late_binder_gets_current_state_not_history() {
        let mut manager = TestManager::default();
        let window = manager.create_handle();
        manager.set_title(&window, "one");
        manager.set_title(&window, "two");
        manager.set_title(&window, "three");
        manager.set_app_id(&window, "org.example.app");
        manager.set_maximized(&window, true);
        manager.set_activated(&window, true);
        manager.set_maximized(&window, false);
        manager.output_enter(&window, O1);
        manager.dispatch_idle();

        let client = MockClient::new(1);
        manager.bind_global(client.global());

        assert_eq!(
            client.events(window.id()),
            vec![
                Event::Toplevel,
                Event::Title("three".into()),
                Event::AppId("org.example.app".into()),
                Event::State(ToplevelState::ACTIVATED),
                Event::Enter(O1),
                Event::Done,
            ]
        );
    }

    #[test]
    fn test_bind_global_resolves_parent_created_later() {
        let mut manager = TestManager::default();
        let child = manager.create_handle();
        let parent = manager.create_handle();
        manager.set_parent(&child, Some(&parent));

        let client = MockClient::new(1);
        manager.bind_global(client.global());

        assert!(client.events(child.id()).contains(&Event::Parent(Some(parent.id()))));
        // Every toplevel is announced before any state is sent
        let all = client.all();
        assert_eq!(all[0], (Some(child.id()), Event::Toplevel));
        assert_eq!(all[1], (Some(parent.id()), Event::Toplevel));
    }

    #[test]
    fn test_direct_bind() {
        let mut manager = TestManager::default();
        let window = manager.create_handle();
        manager.set_title(&window, "Terminal");

        let client = MockClient::new(1);
        let binding = manager.bind(window.id(), client.toplevel(window.id())).unwrap();
        assert_eq!(
            client.events(window.id()),
            vec![Event::Title("Terminal".into()), Event::State(ToplevelState::empty()), Event::Done]
        );

        manager.unbind(binding);
        assert_eq!(manager.binding_count(window.id()), 0);

        let gone = manager.create_handle();
        let gone_id = gone.id();
        manager.destroy_handle(gone);
        let err = manager.bind(gone_id, client.toplevel(gone_id)).unwrap_err();
        assert_eq!(err, CoreError::InvalidToplevelId(gone_id));
    }

    #[test]
    fn test_advertise_failure_is_local() {
        let mut manager = TestManager::default();
        let broken = MockClient::new(1);
        let mut global = broken.global();
        global.fail = true;
        manager.bind_global(global);
        let healthy = MockClient::new(2);
        manager.bind_global(healthy.global());

        let window = manager.create_handle();
        manager.set_title(&window, "still works");

        assert!(broken.all().is_empty());
        assert_eq!(manager.binding_count(window.id()), 1);
        assert!(healthy.events(window.id()).contains(&Event::Title("still works".into())));
    }

    // =========================================================================
    // Attribute broadcast
    // =========================================================================

    #[test]
    fn test_state_carries_full_flag_set() {
        let mut manager = TestManager::default();
        let client = MockClient::new(1);
        manager.bind_global(client.global());
        let window = manager.create_handle();
        client.clear();

        manager.set_maximized(&window, true);
        manager.set_fullscreen(&window, true);
        manager.set_maximized(&window, false);

        assert_eq!(
            client.events(window.id()),
            vec![
                Event::State(ToplevelState::MAXIMIZED),
                Event::State(ToplevelState::MAXIMIZED | ToplevelState::FULLSCREEN),
                Event::State(ToplevelState::FULLSCREEN),
            ]
        );
        assert_eq!(manager.state(window.id()), Some(ToplevelState::FULLSCREEN));
    }

    #[test]
    fn test_redundant_values_are_restated_by_default() {
        let mut manager = TestManager::default();
        let client = MockClient::new(1);
        manager.bind_global(client.global());
        let window = manager.create_handle();
        client.clear();

        manager.set_title(&window, "same");
        manager.set_title(&window, "same");
        manager.set_minimized(&window, false);

        assert_eq!(
            client.events(window.id()),
            vec![
                Event::Title("same".into()),
                Event::Title("same".into()),
                Event::State(ToplevelState::empty()),
            ]
        );
    }

    #[test]
    fn test_suppress_redundant() {
        let config = ManagerConfig { suppress_redundant: true, ..Default::default() };
        let mut manager = TestManager::new(config);
        let client = MockClient::new(1);
        manager.bind_global(client.global());
        let window = manager.create_handle();
        client.clear();

        manager.set_title(&window, "same");
        manager.set_title(&window, "same");
        manager.set_app_id(&window, "app");
        manager.set_app_id(&window, "app");
        manager.set_minimized(&window, false);

        assert_eq!(
            client.events(window.id()),
            vec![Event::Title("same".into()), Event::AppId("app".into())]
        );
    }

    #[test]
    fn test_done_is_coalesced_per_tick() {
        let mut manager = TestManager::default();
        let client = MockClient::new(1);
        manager.bind_global(client.global());
        let window = manager.create_handle();
        client.clear();

        manager.set_title(&window, "a");
        manager.set_app_id(&window, "b");
        manager.set_activated(&window, true);
        assert!(manager.has_pending_flush(window.id()));
        assert_eq!(manager.dispatch_idle(), 1);

        let done = client.events(window.id()).into_iter().filter(|e| *e == Event::Done).count();
        assert_eq!(done, 1);
        assert_eq!(manager.dispatch_idle(), 0);
    }

    #[test]
    fn test_broadcast_without_bindings() {
        let mut manager = TestManager::default();
        let window = manager.create_handle();

        manager.set_title(&window, "nobody listens");
        manager.set_fullscreen(&window, true);
        manager.output_enter(&window, O1);
        assert_eq!(manager.dispatch_idle(), 1);

        assert_eq!(manager.title(window.id()), Some("nobody listens"));
        assert_eq!(manager.outputs(window.id()), vec![O1]);
    }

    #[test]
    fn test_dead_bindings_are_pruned() {
        let mut manager = TestManager::default();
        let a = MockClient::new(1);
        let b = MockClient::new(2);
        manager.bind_global(a.global());
        manager.bind_global(b.global());
        let window = manager.create_handle();
        a.clear();
        b.clear();

        a.binding(window.id()).destroy();
        b.disconnect();
        manager.set_title(&window, "hello");

        assert!(a.all().is_empty());
        assert!(b.all().is_empty());
        assert_eq!(manager.binding_count(window.id()), 0);
    }

    // =========================================================================
    // Outputs
    // =========================================================================

    #[test]
    fn test_output_changes_collapse_to_net_result() {
        let mut manager = TestManager::default();
        let client = MockClient::new(1);
        manager.bind_global(client.global());
        let window = manager.create_handle();
        client.clear();

        manager.output_enter(&window, O1);
        manager.output_leave(&window, O1);
        manager.output_enter(&window, O1);
        manager.output_enter(&window, O2);
        manager.output_leave(&window, O2);
        manager.output_leave(&window, O3);
        assert!(client.all().is_empty());

        manager.dispatch_idle();
        assert_eq!(client.events(window.id()), vec![Event::Enter(O1), Event::Done]);
        assert_eq!(manager.outputs(window.id()), vec![O1]);

        client.clear();
        manager.output_leave(&window, O1);
        manager.output_enter(&window, O1);
        manager.dispatch_idle();
        assert!(client.events(window.id()).is_empty());
    }

    #[test]
    fn test_redundant_output_calls_schedule_nothing() {
        let mut manager = TestManager::default();
        let window = manager.create_handle();
        manager.output_enter(&window, O1);
        manager.dispatch_idle();

        manager.output_enter(&window, O1);
        manager.output_leave(&window, O2);
        assert!(!manager.has_pending_flush(window.id()));
    }

    #[test]
    fn test_uncoalesced_outputs_flush_immediately() {
        let config = ManagerConfig { coalesce_outputs: false, ..Default::default() };
        let mut manager = TestManager::new(config);
        let client = MockClient::new(1);
        manager.bind_global(client.global());
        let window = manager.create_handle();
        client.clear();

        manager.output_enter(&window, O2);
        assert_eq!(client.events(window.id()), vec![Event::Enter(O2), Event::Done]);
        assert!(!manager.has_pending_flush(window.id()));
    }

    #[test]
    fn test_output_destroyed() {
        let mut manager = TestManager::default();
        let client = MockClient::new(1);
        manager.bind_global(client.global());
        let window = manager.create_handle();
        manager.output_enter(&window, O1);
        manager.output_enter(&window, O2);
        manager.dispatch_idle();
        client.clear();

        manager.output_destroyed(O1);
        manager.dispatch_idle();

        assert_eq!(client.events(window.id()), vec![Event::Leave(O1), Event::Done]);
        assert_eq!(manager.outputs(window.id()), vec![O2]);
    }

    #[test]
    fn test_undelivered_enter_is_retried() {
        let mut manager = TestManager::default();
        let client = MockClient::new(1);
        client.unbound_outputs.borrow_mut().push(O3);
        manager.bind_global(client.global());
        let window = manager.create_handle();
        client.clear();

        manager.output_enter(&window, O3);
        manager.dispatch_idle();
        assert!(client.events(window.id()).is_empty());

        client.unbound_outputs.borrow_mut().clear();
        client.clear();
        manager.output_bound(O3);
        manager.dispatch_idle();
        assert_eq!(client.events(window.id()), vec![Event::Enter(O3), Event::Done]);
    }

    #[test]
    fn test_output_bound_spares_up_to_date_clients() {
        let mut manager = TestManager::default();
        let ready = MockClient::new(1);
        let late = MockClient::new(2);
        late.unbound_outputs.borrow_mut().push(O1);
        manager.bind_global(ready.global());
        manager.bind_global(late.global());
        let window = manager.create_handle();
        manager.output_enter(&window, O1);
        manager.dispatch_idle();
        assert_eq!(ready.events(window.id()).last(), Some(&Event::Done));
        assert_eq!(late.events(window.id()), vec![
            Event::Toplevel,
            Event::State(ToplevelState::empty()),
            Event::Done,
        ]);

        ready.clear();
        late.clear();
        late.unbound_outputs.borrow_mut().clear();
        manager.output_bound(O1);
        manager.dispatch_idle();
        assert!(ready.events(window.id()).is_empty());
        assert_eq!(late.events(window.id()), vec![Event::Enter(O1), Event::Done]);
    }

    #[test]
    fn test_attribute_change_closes_batch_for_every_binding() {
        let mut manager = TestManager::default();
        let client = MockClient::new(1);
        manager.bind_global(client.global());
        let window = manager.create_handle();
        manager.output_enter(&window, O1);
        manager.dispatch_idle();
        client.clear();

        manager.set_title(&window, "Mail");
        manager.dispatch_idle();
        assert_eq!(client.events(window.id()), vec![Event::Title("Mail".into()), Event::Done]);

        client.clear();
        manager.output_bound(O1);
        manager.dispatch_idle();
        assert!(client.events(window.id()).is_empty());
    }

    // =========================================================================
    // Parent
    // =========================================================================

    #[test]
    fn test_parent_only_sent_to_clients_bound_to_both() {
        let mut manager = TestManager::default();
        let both = MockClient::new(1);
        manager.bind_global(both.global());
        let parent = manager.create_handle();
        let child = manager.create_handle();

        let child_only = MockClient::new(2);
        manager.bind(child.id(), child_only.toplevel(child.id())).unwrap();
        both.clear();
        child_only.clear();

        manager.set_parent(&child, Some(&parent));
        assert_eq!(both.events(child.id()), vec![Event::Parent(Some(parent.id()))]);
        assert!(child_only.all().is_empty());
        assert_eq!(manager.parent(child.id()), Some(parent.id()));

        // Unchanged parent: nothing
        manager.set_parent(&child, Some(&parent));
        assert_eq!(both.events(child.id()).len(), 1);

        manager.set_parent(&child, None);
        assert_eq!(
            both.events(child.id()),
            vec![Event::Parent(Some(parent.id())), Event::Parent(None)]
        );
        assert!(child_only.all().is_empty());
        assert_eq!(manager.parent(child.id()), None);
    }

    #[test]
    #[should_panic(expected = "cannot be its own parent")]
    fn test_self_parent_panics() {
        let mut manager = TestManager::default();
        let window = manager.create_handle();
        manager.set_parent(&window, Some(&window));
    }

    #[test]
    fn test_destroying_parent_orphans_children() {
        let mut manager = TestManager::default();
        let both = MockClient::new(1);
        manager.bind_global(both.global());
        let parent = manager.create_handle();
        let child = manager.create_handle();
        let other_child = manager.create_handle();
        manager.set_parent(&child, Some(&parent));
        manager.set_parent(&other_child, Some(&parent));

        let child_only = MockClient::new(2);
        manager.bind(child.id(), child_only.toplevel(child.id())).unwrap();
        manager.dispatch_idle();
        both.clear();
        child_only.clear();

        let parent_id = parent.id();
        manager.destroy_handle(parent);

        assert_eq!(
            both.all(),
            vec![
                (Some(parent_id), Event::Closed),
                (Some(child.id()), Event::Parent(None)),
                (Some(other_child.id()), Event::Parent(None)),
            ]
        );
        assert!(child_only.all().is_empty());
        assert_eq!(manager.parent(child.id()), None);
        assert_eq!(manager.parent(other_child.id()), None);
    }

    #[test]
    fn test_client_that_dropped_parent_is_not_told() {
        let mut manager = TestManager::default();
        let client = MockClient::new(1);
        manager.bind_global(client.global());
        let parent = manager.create_handle();
        let child = manager.create_handle();
        manager.set_parent(&child, Some(&parent));
        client.clear();

        client.binding(parent.id()).destroy();
        manager.destroy_handle(parent);

        assert!(client.events(child.id()).is_empty());
    }

    // =========================================================================
    // Destruction
    // =========================================================================

    #[test]
    fn test_destroy_cancels_pending_flush() {
        let mut manager = TestManager::default();
        let client = MockClient::new(1);
        manager.bind_global(client.global());
        let window = manager.create_handle();
        let id = window.id();
        client.clear();

        manager.output_enter(&window, O1);
        assert!(manager.has_pending_flush(id));
        manager.destroy_handle(window);

        assert!(!manager.has_pending_flush(id));
        assert_eq!(manager.dispatch_idle(), 0);
        assert_eq!(client.events(id), vec![Event::Closed]);
        assert!(!manager.contains(id));
    }

    #[test]
    fn test_destroy_listener_runs_before_closed() {
        let mut manager = TestManager::default();
        let client = MockClient::new(1);
        manager.bind_global(client.global());
        let window = manager.create_handle();
        client.clear();

        let seen = Rc::new(RefCell::new(None));
        let log = client.log.clone();
        let seen_in = seen.clone();
        manager.on_handle_destroy(&window, move |id| {
            *seen_in.borrow_mut() = Some((id, log.borrow().len()));
        });
        let id = window.id();
        manager.destroy_handle(window);

        assert_eq!(*seen.borrow(), Some((id, 0)));
        assert_eq!(client.events(id), vec![Event::Closed]);
    }

    #[test]
    fn test_manager_scenario() {
        let mut manager = TestManager::default();
        let a = MockClient::new(1);
        manager.bind_global(a.global());

        let h1 = manager.create_handle();
        a.clear();
        manager.set_title(&h1, "Editor");
        manager.output_enter(&h1, O1);
        assert_eq!(a.events(h1.id()), vec![Event::Title("Editor".into())]);

        manager.dispatch_idle();
        assert_eq!(
            a.events(h1.id()),
            vec![Event::Title("Editor".into()), Event::Enter(O1), Event::Done]
        );

        let h2 = manager.create_handle();
        manager.set_parent(&h2, Some(&h1));
        assert!(a.events(h2.id()).contains(&Event::Parent(Some(h1.id()))));

        let b = MockClient::new(2);
        manager.bind(h2.id(), b.toplevel(h2.id())).unwrap();
        manager.dispatch_idle();
        a.clear();
        b.clear();

        let h1_id = h1.id();
        manager.destroy_handle(h1);
        assert_eq!(
            a.all(),
            vec![(Some(h1_id), Event::Closed), (Some(h2.id()), Event::Parent(None))]
        );
        assert!(b.all().is_empty());
    }

    #[test]
    fn test_manager_destroy() {
        let mut manager = TestManager::default();
        let client = MockClient::new(1);
        manager.bind_global(client.global());
        let first = manager.create_handle();
        let second = manager.create_handle();
        client.clear();

        let destroyed = Rc::new(Cell::new(false));
        let flag = destroyed.clone();
        manager.on_destroy(move || flag.set(true));
        manager.destroy();

        assert!(destroyed.get());
        assert_eq!(
            client.all(),
            vec![
                (Some(second.id()), Event::Closed),
                (Some(first.id()), Event::Closed),
                (None, Event::Finished),
            ]
        );
    }

    #[test]
    fn test_manager_drop_tears_down() {
        let destroyed = Rc::new(Cell::new(false));
        {
            let mut manager = TestManager::default();
            let _window = manager.create_handle();
            let flag = destroyed.clone();
            manager.on_destroy(move || flag.set(true));
        }
        assert!(destroyed.get());
    }

    #[test]
    #[should_panic(expected = "belongs to a different toplevel manager")]
    fn test_foreign_handle_panics() {
        let mut first = TestManager::default();
        let mut second = TestManager::default();
        let window = first.create_handle();
        second.set_title(&window, "wrong manager");
    }

    // =========================================================================
    // Globals
    // =========================================================================

    #[test]
    fn test_stop() {
        let mut manager = TestManager::default();
        let client = MockClient::new(1);
        let global = manager.bind_global(client.global());
        let existing = manager.create_handle();
        client.clear();

        manager.stop(global);
        assert_eq!(client.all(), vec![(None, Event::Finished)]);
        assert_eq!(manager.global_count(), 0);

        let unseen = manager.create_handle();
        manager.set_title(&existing, "still bound");
        assert!(client.events(unseen.id()).is_empty());
        assert_eq!(client.events(existing.id()), vec![Event::Title("still bound".into())]);
    }

    #[test]
    fn test_dead_globals_are_not_advertised_to() {
        let mut manager = TestManager::default();
        let client = MockClient::new(1);
        let global = client.global();
        let alive = global.alive.clone();
        manager.bind_global(global);

        alive.set(false);
        let window = manager.create_handle();
        assert!(client.all().is_empty());
        assert_eq!(manager.global_count(), 0);
        assert_eq!(manager.binding_count(window.id()), 0);
    }

    // =========================================================================
    // Requests
    // =========================================================================

    #[test]
    fn test_requests_reach_listeners_without_changing_state() {
        let mut manager = TestManager::default();
        let window = manager.create_handle();
        let id = window.id();

        let log = Rc::new(RefCell::new(Vec::new()));
        let l = log.clone();
        manager.on_request_maximize(&window, move |e| l.borrow_mut().push(format!("maximize {}", e.maximized)));
        let l = log.clone();
        manager.on_request_activate(&window, move |e| l.borrow_mut().push(format!("activate {}", e.seat)));
        let l = log.clone();
        manager.on_request_move(&window, move |e| l.borrow_mut().push(format!("move {},{}", e.x, e.y)));
        let l = log.clone();
        manager.on_request_fullscreen(&window, move |e| {
            l.borrow_mut().push(format!("fullscreen {} {:?}", e.fullscreen, e.output))
        });
        let l = log.clone();
        manager.on_set_rectangle(&window, move |e| {
            l.borrow_mut().push(format!("rect {} {}x{}", e.surface, e.width, e.height))
        });

        manager.handle_request(id, ToplevelRequest::Maximize { maximized: true }).unwrap();
        manager.handle_request(id, ToplevelRequest::Activate { seat: "seat0" }).unwrap();
        manager.handle_request(id, ToplevelRequest::Move { x: 10, y: -4 }).unwrap();
        manager
            .handle_request(id, ToplevelRequest::Fullscreen { fullscreen: true, output: Some(O2) })
            .unwrap();
        manager
            .handle_request(id, ToplevelRequest::SetRectangle { surface: 7, x: 0, y: 0, width: 32, height: 24 })
            .unwrap();
        // No listener registered: dropped
        manager.handle_request(id, ToplevelRequest::Close).unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                "maximize true".to_string(),
                "activate seat0".to_string(),
                "move 10,-4".to_string(),
                "fullscreen true Some(OutputId(2))".to_string(),
                "rect 7 32x24".to_string(),
            ]
        );
        assert_eq!(manager.state(id), Some(ToplevelState::empty()));
    }

    #[test]
    fn test_request_after_destroy() {
        let mut manager = TestManager::default();
        let window = manager.create_handle();
        let closes = Rc::new(Cell::new(0));
        let c = closes.clone();
        manager.on_request_close(&window, move |_| c.set(c.get() + 1));
        manager.on_request_minimize(&window, |_| {});

        let id = window.id();
        manager.handle_request(id, ToplevelRequest::Close).unwrap();
        manager.destroy_handle(window);

        let err = manager.handle_request(id, ToplevelRequest::Close).unwrap_err();
        assert_eq!(err, CoreError::InvalidToplevelId(id));
        assert_eq!(closes.get(), 1);
    }
}
