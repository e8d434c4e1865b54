use tracing::instrument;

use super::{readable, thumbnail::CoverStore};
use crate::services::media::{
    host::MediaPropertiesSource, state::MediaProperties, types::PlaybackType,
};

/// Build the metadata sub-document and persist its cover.
#[instrument(skip_all)]
pub async fn normalize_media(
    source: &dyn MediaPropertiesSource,
    cover: &CoverStore,
) -> MediaProperties {
    let mut media = MediaProperties {
        title: readable("title", source.title()),
        album_title: readable("album_title", source.album_title()),
        album_artist: readable("album_artist", source.album_artist()),
        artist: readable("artist", source.artist()),
        subtitle: readable("subtitle", source.subtitle()),
        track_number: readable("track_number", source.track_number()),
        album_track_count: readable("album_track_count", source.album_track_count()),
        genres: readable("genres", source.genres()),
        playback_type: readable("playback_type", source.playback_type())
            .flatten()
            .map(PlaybackType::from),
        ..MediaProperties::default()
    };

    let bytes = cover.load(source.thumbnail()).await;
    cover.persist(&bytes).await;
    media.set_cover(bytes, cover.path());

    media
}
