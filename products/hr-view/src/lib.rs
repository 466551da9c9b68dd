//! Client side of the employee directory.
//!
//! [`ViewController`] keeps a mirror of the server's record list and turns
//! it into plain view models ([`ListView`], [`DetailsView`]) that a UI layer
//! draws. All network traffic goes through the [`EmployeeApi`] trait;
//! [`HttpEmployeeApi`] is the `reqwest` implementation.

pub mod api;
pub mod controller;
pub mod form;
pub mod notify;
pub mod search;
pub mod view;

pub use api::{ClientError, ClientResult, EmployeeApi, HttpEmployeeApi};
pub use controller::{
    DetailsMode, Modal, Mutation, MutationOutcome, MutationReply, PendingMutation, Startup,
    ViewController,
};
pub use form::{EmployeeForm, FormError};
pub use notify::{Notification, NotificationKind, Notifier};
pub use view::{Card, DetailsView, EmptyState, ListView};
