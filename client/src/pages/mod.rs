//! Page modules for route-level screens.
//!
//! ARCHITECTURE
//! ============
//! Each page owns route-scoped orchestration. Protected pages are wrapped in
//! `ProtectedRoute` by `app`; `login` and `logout` are public.

pub mod home;
pub mod login;
pub mod logout;
pub mod section;
