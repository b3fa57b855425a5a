use axum::{extract::State, http::StatusCode, Json};

use crate::api::{ContactRequest, ContactSummary};
use crate::auth::AuthUser;
use crate::database::models::Contact;
use crate::error::ApiResult;
use crate::middleware::{JsonBody, PathId};
use crate::state::AppState;

/// GET /api/contacts - the caller's own contacts, full records
pub async fn list_own(State(state): State<AppState>, actor: AuthUser) -> ApiResult<Json<Vec<Contact>>> {
    Ok(Json(state.contacts.list_own(&actor).await?))
}

/// GET /api/contacts/list - all contacts for admins, own contacts otherwise
///
/// Expected Output (Success):
/// ```json
/// [
///   {
///     "id": 7,
///     "firstName": "Jane",
///     "lastName": "Doe",
///     "email": "jane@example.com",
///     "motherName": null,
///     "birthDate": "1990-04-01",
///     "tajNumber": "123456789",
///     "taxId": "1234567890",
///     "phoneNumbers": [ { "phoneNumber": "1234567890" } ],
///     "addresses": [ { "street": "Main St", "city": "X", "zipCode": "00000" } ]
///   }
/// ]
/// ```
pub async fn list_visible(
    State(state): State<AppState>,
    actor: AuthUser,
) -> ApiResult<Json<Vec<ContactSummary>>> {
    Ok(Json(state.contacts.list_visible(&actor).await?))
}

/// GET /api/contacts/:id - one contact. Another user's contact is 404 for non-admins.
pub async fn get_contact(
    State(state): State<AppState>,
    actor: AuthUser,
    PathId(id): PathId,
) -> ApiResult<Json<Contact>> {
    Ok(Json(state.contacts.get(&actor, id).await?))
}

/// POST /api/contacts - create a contact owned by the caller
///
/// Expected Input:
/// ```json
/// {
///   "firstName": "Jane",               // Required
///   "lastName": "Doe",                 // Required
///   "email": "jane@example.com",       // Required
///   "tajNumber": "123456789",          // Required, 9 digits
///   "taxId": "1234567890",             // Required, 10 digits
///   "motherName": "Mary",              // Optional
///   "birthDate": "1990-04-01",         // Optional
///   "phoneNumbers": ["1234567890"],    // Optional, 10 or 11 digits each
///   "addresses": [ { "street": "Main St", "city": "X", "zipCode": "00000" } ]
/// }
/// ```
///
/// Returns 201 with the stored contact, including `userId` and child ids.
pub async fn create_contact(
    State(state): State<AppState>,
    actor: AuthUser,
    JsonBody(payload): JsonBody<ContactRequest>,
) -> ApiResult<(StatusCode, Json<Contact>)> {
    let contact = state.contacts.create(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

/// PUT /api/contacts/:id - replace a contact
///
/// Same body as POST. This is a replacement, not a merge: every field is overwritten,
/// and `phoneNumbers` / `addresses` replace the stored lists entirely (omitting a list
/// clears it).
pub async fn update_contact(
    State(state): State<AppState>,
    actor: AuthUser,
    PathId(id): PathId,
    JsonBody(payload): JsonBody<ContactRequest>,
) -> ApiResult<Json<Contact>> {
    Ok(Json(state.contacts.update(&actor, id, payload).await?))
}

/// DELETE /api/contacts/:id - delete a contact with its phone numbers and addresses
pub async fn delete_contact(
    State(state): State<AppState>,
    actor: AuthUser,
    PathId(id): PathId,
) -> ApiResult<StatusCode> {
    state.contacts.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
