//! Media Converter: turns a source message's media into an input-media
//! descriptor suitable for a send request, by reference-copy or re-upload.

use tokio_util::sync::CancellationToken;

use crate::classify::{is_photo_or_document, is_protected};
use crate::errors::ForwardError;
use crate::model::{Elem, MediaDescriptor, Message};
use crate::ports::{InputMedia, UploadInput};
use crate::upload::CloneUploaderAdapter;

/// Reference-copy constructor: builds input media from an existing
/// server-side descriptor without touching the uploader. Returns `None` when
/// the descriptor cannot be expressed as input (e.g. an empty document, or a
/// media kind with no server-side reference at all).
pub fn conv_input_media(media: &MediaDescriptor) -> Option<InputMedia> {
    match media {
        MediaDescriptor::Photo {
            sizes,
            spoiler,
            ttl_seconds,
        } => sizes.last().map(|s| InputMedia::Photo {
            id: s.id,
            access_hash: s.access_hash,
            file_reference: s.file_reference.clone(),
            spoiler: *spoiler,
            ttl_seconds: *ttl_seconds,
        }),
        MediaDescriptor::Document {
            doc,
            spoiler,
            ttl_seconds,
        } => {
            if doc.is_empty() {
                None
            } else {
                Some(InputMedia::Document {
                    id: doc.id,
                    access_hash: doc.access_hash,
                    file_reference: doc.file_reference.clone(),
                    spoiler: *spoiler,
                    ttl_seconds: *ttl_seconds,
                })
            }
        }
        MediaDescriptor::Other { .. } => None,
    }
}

/// The largest representable source file for a message, if any.
pub fn get_media(msg: &Message) -> Option<&MediaDescriptor> {
    msg.media.as_ref()
}

/// The thumbnail descriptor carried by a document, if any.
pub fn get_document_thumb(doc: &crate::model::DocumentRef) -> Option<&MediaDescriptor> {
    doc.thumb.as_deref()
}

fn media_to_upload_input(media: &MediaDescriptor, part_size_kb: u32) -> Option<UploadInput> {
    let source_ref = match media {
        MediaDescriptor::Photo { sizes, .. } => sizes.last()?.file_reference.clone(),
        MediaDescriptor::Document { doc, .. } if !doc.is_empty() => doc.file_reference.clone(),
        _ => return None,
    };
    Some(UploadInput {
        source_ref,
        total_size: 0,
        part_size_kb,
    })
}

/// Decides whether `msg`'s media (owned by `job.from`) can be reference-copied
/// into the destination send, or must be re-uploaded through `adapter` first
/// because the source is content-protected. Staging is a cancellable
/// suspension point, same as a send.
pub async fn convert_media(
    job: &Elem,
    msg: &Message,
    adapter: &CloneUploaderAdapter,
    part_size_kb: u32,
    cancel: &CancellationToken,
) -> Result<InputMedia, ForwardError> {
    let media = get_media(msg).ok_or(ForwardError::ConvertFailed("not-a-media-message"))?;

    if !is_protected(&job.from, msg) || !is_photo_or_document(media) {
        return conv_input_media(media).ok_or(ForwardError::ConvertFailed("unsupported-media"));
    }

    match media {
        MediaDescriptor::Photo {
            sizes,
            spoiler,
            ttl_seconds,
        } => {
            let largest = sizes
                .last()
                .ok_or(ForwardError::ConvertFailed("photo-has-no-sizes"))?;
            let input = UploadInput {
                source_ref: largest.file_reference.clone(),
                total_size: 0,
                part_size_kb,
            };
            let file = adapter.stage_primary(job, input, cancel).await?;
            Ok(InputMedia::UploadedPhoto {
                file,
                spoiler: *spoiler,
                ttl_seconds: *ttl_seconds,
            })
        }
        MediaDescriptor::Document {
            doc,
            spoiler,
            ttl_seconds,
        } => {
            if doc.is_empty() {
                return Err(ForwardError::ConvertFailed("document-is-empty"));
            }
            let thumb = get_document_thumb(doc)
                .ok_or(ForwardError::ConvertFailed("document-has-no-thumbnail"))?;
            let thumb_input = media_to_upload_input(thumb, part_size_kb)
                .ok_or(ForwardError::ConvertFailed("thumbnail-not-representable"))?;
            let primary_input = UploadInput {
                source_ref: doc.file_reference.clone(),
                total_size: 0,
                part_size_kb,
            };
            let primary_file = adapter.stage_primary(job, primary_input, cancel).await?;
            let thumb_file = adapter.stage_thumbnail(job, thumb_input, cancel).await?;
            Ok(InputMedia::UploadedDocument {
                file: primary_file,
                thumb: Some(thumb_file),
                mime_type: doc.mime_type.clone(),
                attributes: doc.attributes.clone(),
                spoiler: *spoiler,
                ttl_seconds: *ttl_seconds,
            })
        }
        MediaDescriptor::Other { .. } => {
            unreachable!("is_photo_or_document already filtered this branch out")
        }
    }
}
