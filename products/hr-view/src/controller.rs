use chrono::NaiveDate;
use products_hr::{Employee, EmployeeId, EmployeeInput};

use crate::{
    api::{ClientError, ClientResult, EmployeeApi},
    form::{EmployeeForm, FormError},
    notify::{Notification, NotificationKind, Notifier},
    search,
    view::{DetailsView, ListView},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Startup {
    Ready,
    RedirectToLogin,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DetailsMode {
    Viewing,
    Editing(EmployeeForm),
    ConfirmDelete,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Modal {
    #[default]
    Closed,
    Add(EmployeeForm),
    Details {
        id: EmployeeId,
        mode: DetailsMode,
    },
}

/// A write the controller has committed to sending.
#[derive(Clone, Debug, PartialEq)]
pub enum Mutation {
    Create(EmployeeInput),
    Update(EmployeeId, EmployeeInput),
    Delete(EmployeeId),
}

/// Returned by [`ViewController::begin_submit`] and
/// [`ViewController::begin_delete`]. Until it is handed back through
/// [`ViewController::complete`], the controller refuses further mutations
/// and reports its controls as disabled.
#[derive(Debug)]
#[must_use = "a pending mutation keeps the controls disabled until completed"]
pub struct PendingMutation {
    mutation: Mutation,
}

impl PendingMutation {
    pub fn mutation(&self) -> &Mutation {
        &self.mutation
    }

    pub async fn send<A: EmployeeApi>(self, api: &A) -> MutationReply {
        let result = match &self.mutation {
            Mutation::Create(input) => api.create(input).await,
            Mutation::Update(id, input) => api.update(*id, input).await,
            Mutation::Delete(id) => api.delete(*id).await.map(|deleted| deleted.employee),
        };
        MutationReply {
            mutation: self.mutation,
            result,
        }
    }
}

#[derive(Debug)]
pub struct MutationReply {
    mutation: Mutation,
    result: ClientResult<Employee>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MutationOutcome {
    Created(Employee),
    Updated(Employee),
    Deleted(Employee),
    /// Client-side validation failed; nothing was sent.
    Invalid(FormError),
    /// The server or the network refused; the mirror is unchanged.
    Failed(ClientError),
    /// Another mutation is still in flight.
    Busy,
    /// No form or confirmation is open.
    Idle,
}

/// Drives the directory page: mirror, search, modals and notifications.
#[derive(Debug)]
pub struct ViewController<A> {
    api: A,
    mirror: Vec<Employee>,
    query: String,
    modal: Modal,
    notifier: Notifier,
    loading: bool,
    in_flight: bool,
}

impl<A: EmployeeApi> ViewController<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            mirror: Vec::new(),
            query: String::new(),
            modal: Modal::Closed,
            notifier: Notifier::default(),
            loading: false,
            in_flight: false,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Probes the list endpoint. A 401 or an unreachable server sends the
    /// user to the login page; otherwise the response seeds the mirror.
    pub async fn start(&mut self) -> Startup {
        self.loading = true;
        let result = self.api.list().await;
        self.loading = false;
        match result {
            Ok(employees) => {
                tracing::debug!(count = employees.len(), "directory loaded");
                self.mirror = employees;
                Startup::Ready
            }
            Err(err) if err.is_unauthorized() || matches!(err, ClientError::Network(_)) => {
                Startup::RedirectToLogin
            }
            Err(err) => {
                self.notify_error(format!("Error loading employees: {err}"));
                Startup::Ready
            }
        }
    }

    pub async fn reload(&mut self) -> ClientResult<()> {
        self.loading = true;
        let result = self.api.list().await;
        self.loading = false;
        match result {
            Ok(employees) => {
                self.mirror = employees;
                Ok(())
            }
            Err(err) => {
                self.notify_error(format!("Error loading employees: {err}"));
                Err(err)
            }
        }
    }

    pub async fn logout(&mut self) -> Startup {
        if let Err(err) = self.api.logout().await {
            tracing::warn!(error = %err, "logout request failed");
        }
        self.mirror.clear();
        self.modal = Modal::Closed;
        Startup::RedirectToLogin
    }

    pub fn mirror(&self) -> &[Employee] {
        &self.mirror
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Called on every keystroke in the search box.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn visible(&self) -> Vec<&Employee> {
        search::filter(&self.mirror, &self.query)
    }

    pub fn list_view(&self) -> ListView {
        ListView::render(&self.mirror, &self.visible())
    }

    pub fn modal(&self) -> &Modal {
        &self.modal
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Submit and confirm buttons are disabled while a mutation is pending.
    pub fn controls_enabled(&self) -> bool {
        !self.in_flight
    }

    pub fn notification(&mut self) -> Option<&Notification> {
        self.notifier.current()
    }

    pub fn notifier_mut(&mut self) -> &mut Notifier {
        &mut self.notifier
    }

    pub fn open_add(&mut self, today: NaiveDate) {
        self.modal = Modal::Add(EmployeeForm::blank(today));
    }

    /// Opens the details modal for a record in the mirror.
    pub fn open_details(&mut self, id: EmployeeId) -> bool {
        if self.find(id).is_none() {
            return false;
        }
        self.modal = Modal::Details {
            id,
            mode: DetailsMode::Viewing,
        };
        true
    }

    pub fn details(&self) -> Option<DetailsView> {
        match &self.modal {
            Modal::Details { id, .. } => self.find(*id).map(DetailsView::from),
            _ => None,
        }
    }

    /// Switches the details modal into an edit form holding current values.
    pub fn begin_edit(&mut self) -> bool {
        let Modal::Details { id, .. } = self.modal else {
            return false;
        };
        let Some(employee) = self.find(id) else {
            return false;
        };
        let form = EmployeeForm::from_employee(employee);
        self.modal = Modal::Details {
            id,
            mode: DetailsMode::Editing(form),
        };
        true
    }

    /// Re-reads the open record from the server, then opens the edit form on
    /// the fresh values.
    pub async fn load_for_edit(&mut self) -> bool {
        let Modal::Details { id, .. } = self.modal else {
            return false;
        };
        self.loading = true;
        let result = self.api.get(id).await;
        self.loading = false;
        match result {
            Ok(fresh) => {
                if let Some(slot) = self.mirror.iter_mut().find(|e| e.id == id) {
                    *slot = fresh;
                }
                self.begin_edit()
            }
            Err(err) => {
                self.notify_error(format!("Error loading employee: {err}"));
                false
            }
        }
    }

    pub fn cancel_edit(&mut self) {
        if let Modal::Details { mode, .. } = &mut self.modal {
            *mode = DetailsMode::Viewing;
        }
    }

    pub fn request_delete(&mut self) -> bool {
        match &mut self.modal {
            Modal::Details { mode, .. } => {
                *mode = DetailsMode::ConfirmDelete;
                true
            }
            _ => false,
        }
    }

    /// Closing the modal also re-enables the controls, so a mutation whose
    /// reply never arrives cannot lock the page.
    pub fn close_modal(&mut self) {
        self.modal = Modal::Closed;
        self.in_flight = false;
        self.loading = false;
    }

    /// The form currently on screen, if any.
    pub fn form_mut(&mut self) -> Option<&mut EmployeeForm> {
        match &mut self.modal {
            Modal::Add(form) => Some(form),
            Modal::Details {
                mode: DetailsMode::Editing(form),
                ..
            } => Some(form),
            _ => None,
        }
    }

    /// Validates the open form and, when it passes, marks a create or update
    /// as in flight.
    pub fn begin_submit(&mut self) -> Result<PendingMutation, MutationOutcome> {
        if self.in_flight {
            return Err(MutationOutcome::Busy);
        }
        let mutation = match &self.modal {
            Modal::Add(form) => form.validate().map(Mutation::Create),
            Modal::Details {
                id,
                mode: DetailsMode::Editing(form),
            } => form.validate().map(|input| Mutation::Update(*id, input)),
            _ => return Err(MutationOutcome::Idle),
        };
        match mutation {
            Ok(mutation) => Ok(self.start_mutation(mutation)),
            Err(err) => {
                self.notify_error(err.to_string());
                Err(MutationOutcome::Invalid(err))
            }
        }
    }

    /// Marks the delete of the record in the confirmation modal as in flight.
    pub fn begin_delete(&mut self) -> Result<PendingMutation, MutationOutcome> {
        if self.in_flight {
            return Err(MutationOutcome::Busy);
        }
        match self.modal {
            Modal::Details {
                id,
                mode: DetailsMode::ConfirmDelete,
            } => Ok(self.start_mutation(Mutation::Delete(id))),
            _ => Err(MutationOutcome::Idle),
        }
    }

    /// Merges a server reply into the mirror. Failures leave the mirror and
    /// the open modal untouched.
    pub fn complete(&mut self, reply: MutationReply) -> MutationOutcome {
        self.in_flight = false;
        self.loading = false;
        let MutationReply { mutation, result } = reply;
        let saved = match result {
            Ok(saved) => saved,
            Err(err) => {
                self.notify_error(err.to_string());
                return MutationOutcome::Failed(err);
            }
        };
        self.modal = Modal::Closed;
        match mutation {
            Mutation::Create(_) => {
                self.mirror.push(saved.clone());
                self.notify(NotificationKind::Success, "Employee added successfully!");
                MutationOutcome::Created(saved)
            }
            Mutation::Update(id, _) => {
                if let Some(slot) = self.mirror.iter_mut().find(|e| e.id == id) {
                    *slot = saved.clone();
                }
                self.notify(NotificationKind::Success, "Employee updated successfully!");
                MutationOutcome::Updated(saved)
            }
            Mutation::Delete(id) => {
                self.mirror.retain(|e| e.id != id);
                self.notify(NotificationKind::Success, "Employee deleted successfully!");
                MutationOutcome::Deleted(saved)
            }
        }
    }

    /// Validate, send and merge in one call.
    pub async fn submit(&mut self) -> MutationOutcome {
        match self.begin_submit() {
            Ok(pending) => self.finish(pending).await,
            Err(outcome) => outcome,
        }
    }

    pub async fn confirm_delete(&mut self) -> MutationOutcome {
        match self.begin_delete() {
            Ok(pending) => self.finish(pending).await,
            Err(outcome) => outcome,
        }
    }

    async fn finish(&mut self, pending: PendingMutation) -> MutationOutcome {
        let reply = pending.send(&self.api).await;
        self.complete(reply)
    }

    fn start_mutation(&mut self, mutation: Mutation) -> PendingMutation {
        self.in_flight = true;
        self.loading = true;
        PendingMutation { mutation }
    }

    fn find(&self, id: EmployeeId) -> Option<&Employee> {
        self.mirror.iter().find(|e| e.id == id)
    }

    fn notify(&mut self, kind: NotificationKind, message: impl Into<String>) {
        self.notifier.show(kind, message);
    }

    fn notify_error(&mut self, message: impl Into<String>) {
        self.notify(NotificationKind::Error, message);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use products_hr::{DeletedEmployee, EmployeeStore, HrError};

    use super::*;
    use crate::view::EmptyState;

    /// In-process stand-in for the server, backed by the real store.
    struct FakeApi {
        store: Mutex<EmployeeStore>,
        authenticated: bool,
        offline: bool,
    }

    impl FakeApi {
        fn seeded() -> Self {
            Self {
                store: Mutex::new(EmployeeStore::with_fixtures()),
                authenticated: true,
                offline: false,
            }
        }

        fn call<T>(
            &self,
            op: impl FnOnce(&mut EmployeeStore) -> Result<T, HrError>,
        ) -> ClientResult<T> {
            if self.offline {
                return Err(ClientError::Network("connection refused".into()));
            }
            if !self.authenticated {
                return Err(status(401, "Unauthorized"));
            }
            let mut store = self.store.lock().unwrap();
            op(&mut store).map_err(|err| match err {
                HrError::Validation(message) => status(400, &message),
                HrError::NotFound(_) => status(404, "Employee not found"),
            })
        }
    }

    fn status(status: u16, message: &str) -> ClientError {
        ClientError::Status {
            status,
            message: message.into(),
        }
    }

    impl EmployeeApi for FakeApi {
        async fn list(&self) -> ClientResult<Vec<Employee>> {
            self.call(|store| Ok(store.list().to_vec()))
        }

        async fn get(&self, id: EmployeeId) -> ClientResult<Employee> {
            self.call(|store| store.get(id).cloned())
        }

        async fn create(&self, input: &EmployeeInput) -> ClientResult<Employee> {
            self.call(|store| store.create(input.clone()))
        }

        async fn update(&self, id: EmployeeId, input: &EmployeeInput) -> ClientResult<Employee> {
            self.call(|store| store.update(id, input.clone()))
        }

        async fn delete(&self, id: EmployeeId) -> ClientResult<DeletedEmployee> {
            self.call(|store| {
                store.delete(id).map(|employee| DeletedEmployee {
                    message: "Employee deleted successfully".into(),
                    employee,
                })
            })
        }

        async fn login(&self, _email: &str, _password: &str) -> ClientResult<String> {
            Ok("Login successful".into())
        }

        async fn logout(&self) -> ClientResult<String> {
            Ok("Logged out".into())
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    async fn ready() -> ViewController<FakeApi> {
        let mut controller = ViewController::new(FakeApi::seeded());
        assert_eq!(controller.start().await, Startup::Ready);
        controller
    }

    fn fill_ann(controller: &mut ViewController<FakeApi>) {
        let form = controller.form_mut().unwrap();
        form.name = "Ann Lee".into();
        form.email = "ann@x.com".into();
        form.position = "QA".into();
        form.department = "Eng".into();
        form.salary = "60000".into();
    }

    fn message(controller: &mut ViewController<FakeApi>) -> String {
        controller.notification().unwrap().message.clone()
    }

    #[tokio::test]
    async fn unauthenticated_start_redirects_to_login() {
        let mut api = FakeApi::seeded();
        api.authenticated = false;
        let mut controller = ViewController::new(api);
        assert_eq!(controller.start().await, Startup::RedirectToLogin);
        assert!(controller.mirror().is_empty());

        let mut api = FakeApi::seeded();
        api.offline = true;
        let mut controller = ViewController::new(api);
        assert_eq!(controller.start().await, Startup::RedirectToLogin);
    }

    #[tokio::test]
    async fn search_filters_the_rendered_subset_only() {
        let mut controller = ready().await;
        controller.set_query("PRODUCT");
        let names: Vec<_> = controller
            .list_view()
            .cards()
            .iter()
            .map(|c| c.name.clone())
            .collect();
        assert_eq!(names, vec!["Jane Smith"]);
        assert_eq!(controller.mirror().len(), 3);

        controller.set_query("zzz");
        assert_eq!(
            controller.list_view(),
            ListView::Empty(EmptyState::NoMatches)
        );
        controller.set_query("");
        assert_eq!(controller.list_view().cards().len(), 3);
    }

    #[tokio::test]
    async fn add_flow_appends_server_record() {
        let mut controller = ready().await;
        controller.open_add(today());
        fill_ann(&mut controller);
        let ann = match controller.submit().await {
            MutationOutcome::Created(ann) => ann,
            other => panic!("unexpected outcome {other:?}"),
        };
        assert_eq!(ann.id, 4);
        assert_eq!(controller.mirror().last(), Some(&ann));
        assert_eq!(controller.modal(), &Modal::Closed);
        assert_eq!(message(&mut controller), "Employee added successfully!");
    }

    #[tokio::test]
    async fn invalid_form_is_not_sent() {
        let mut controller = ready().await;
        controller.open_add(today());
        fill_ann(&mut controller);
        controller.form_mut().unwrap().email = "ann-at-x".into();
        assert_eq!(
            controller.submit().await,
            MutationOutcome::Invalid(FormError::InvalidEmail)
        );
        assert_eq!(controller.api().store.lock().unwrap().len(), 3);
        assert_eq!(message(&mut controller), "Please enter a valid email address");
        assert!(matches!(controller.modal(), Modal::Add(_)));
    }

    #[tokio::test]
    async fn edit_flow_replaces_record_in_place() {
        let mut controller = ready().await;
        assert!(controller.open_details(2));
        assert_eq!(controller.details().unwrap().salary, "$85,000");
        assert!(controller.begin_edit());
        assert_eq!(controller.form_mut().unwrap().name, "Jane Smith");
        controller.form_mut().unwrap().position = "Director".into();
        let outcome = controller.submit().await;
        assert!(matches!(outcome, MutationOutcome::Updated(ref e) if e.position == "Director"));
        let ids: Vec<_> = controller.mirror().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(controller.mirror()[1].position, "Director");
    }

    #[tokio::test]
    async fn edit_form_is_filled_from_the_server_copy() {
        let mut controller = ready().await;
        controller.open_details(1);
        {
            let mut store = controller.api().store.lock().unwrap();
            let mut input = EmployeeInput::from(store.get(1).unwrap());
            input.position = Some("Staff Engineer".into());
            store.update(1, input).unwrap();
        }
        assert!(controller.load_for_edit().await);
        assert_eq!(controller.form_mut().unwrap().position, "Staff Engineer");
        assert_eq!(controller.mirror()[0].position, "Staff Engineer");

        controller.api().store.lock().unwrap().delete(1).unwrap();
        controller.close_modal();
        controller.open_details(1);
        assert!(!controller.load_for_edit().await);
        assert_eq!(
            message(&mut controller),
            "Error loading employee: Employee not found"
        );
    }

    #[tokio::test]
    async fn cancel_edit_returns_to_details() {
        let mut controller = ready().await;
        controller.open_details(1);
        controller.begin_edit();
        controller.cancel_edit();
        assert_eq!(
            controller.modal(),
            &Modal::Details {
                id: 1,
                mode: DetailsMode::Viewing
            }
        );
    }

    #[tokio::test]
    async fn server_failure_keeps_mirror_and_shows_message() {
        let mut controller = ready().await;
        controller.open_details(3);
        controller.begin_edit();
        controller.api().store.lock().unwrap().delete(3).unwrap();
        let outcome = controller.submit().await;
        assert_eq!(
            outcome,
            MutationOutcome::Failed(status(404, "Employee not found"))
        );
        assert_eq!(controller.mirror().len(), 3);
        assert_eq!(message(&mut controller), "Employee not found");
        assert!(controller.controls_enabled());
    }

    #[tokio::test]
    async fn delete_removes_only_after_confirmation() {
        let mut controller = ready().await;
        controller.open_details(2);
        assert_eq!(controller.confirm_delete().await, MutationOutcome::Idle);
        assert_eq!(controller.mirror().len(), 3);

        assert!(controller.request_delete());
        let outcome = controller.confirm_delete().await;
        assert!(matches!(outcome, MutationOutcome::Deleted(ref e) if e.id == 2));
        let ids: Vec<_> = controller.mirror().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn second_submit_while_in_flight_is_refused() {
        let mut controller = ready().await;
        controller.open_add(today());
        fill_ann(&mut controller);
        let pending = controller.begin_submit().unwrap();
        assert!(!controller.controls_enabled());
        assert!(matches!(controller.begin_submit(), Err(MutationOutcome::Busy)));

        let reply = pending.send(controller.api()).await;
        assert!(matches!(controller.complete(reply), MutationOutcome::Created(_)));
        assert!(controller.controls_enabled());
        assert_eq!(controller.api().store.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn closing_the_modal_releases_an_abandoned_mutation() {
        let mut controller = ready().await;
        controller.open_add(today());
        fill_ann(&mut controller);
        drop(controller.begin_submit().unwrap());
        assert!(!controller.controls_enabled());

        controller.close_modal();
        assert!(controller.controls_enabled());
        assert!(!controller.is_loading());
        controller.open_add(today());
        fill_ann(&mut controller);
        assert!(matches!(controller.submit().await, MutationOutcome::Created(_)));
    }

    #[tokio::test]
    async fn deleting_everything_shows_first_run_state() {
        let mut controller = ready().await;
        for id in 1..=3 {
            controller.open_details(id);
            controller.request_delete();
            controller.confirm_delete().await;
        }
        assert_eq!(
            controller.list_view(),
            ListView::Empty(EmptyState::FirstRun)
        );
    }
}
