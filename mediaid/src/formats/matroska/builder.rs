use std::ops::ControlFlow;

use anyhow::Result;
use log::Level;

use crate::ebml::{DataPolicy, Element, ParseContext, ids};
use crate::formats::attachment::save_attachment;
use crate::formats::matroska::Matroska;
use crate::formats::matroska::block::Block;
use crate::formats::matroska::elements::*;
use crate::process::Options;
use crate::log_or_err;
use crate::report::CommentValue;
use crate::utils::errors::EbmlError;

/// Recursive descent over one Matroska file, filling a [`Matroska`] tree.
///
/// Every handler loops on [`ParseContext::next_element`] bounded by the end
/// of the element it was given. Elements it does not know are reported and
/// skipped.
pub struct Builder<'a, 's> {
    ctx: &'a mut ParseContext<'s>,
    options: &'a Options,
    mkv: &'a mut Matroska,
}

impl<'a, 's> Builder<'a, 's> {
    pub fn new(ctx: &'a mut ParseContext<'s>, options: &'a Options, mkv: &'a mut Matroska) -> Self {
        Self { ctx, options, mkv }
    }

    /// Walks top-level elements up to `end`. Returns early once every track
    /// has a data offset, unless the whole file was asked for.
    pub fn parse(&mut self, end: u64) -> Result<()> {
        while let Some(top) = self.ctx.next_element(end, DataPolicy::Skip)? {
            match top.id {
                ids::EBML => self.ebml_header(&top)?,
                ids::SEGMENT => {
                    self.mkv.segment.push(span(&top));
                    if self.segment(&top)?.is_break() {
                        log::debug!("all tracks located, stopping at offset {}", self.ctx.offset());
                        return Ok(());
                    }
                }
                _ => self.ctx.unhandled("root", &top)?,
            }
        }
        Ok(())
    }

    fn ebml_header(&mut self, parent: &Element) -> Result<()> {
        let mut header = EbmlHeader {
            offset: parent.offset,
            length: parent.length,
            ..Default::default()
        };
        while let Some(el) = self.ctx.next_element(parent.end, DataPolicy::All)? {
            match el.id {
                ids::EBMLVERSION => header.version = Some(el.uint()),
                ids::EBMLREADVERSION => header.read_version = Some(el.uint()),
                ids::EBMLMAXIDLENGTH => header.max_id_length = Some(el.uint()),
                ids::EBMLMAXSIZELENGTH => header.max_size_length = Some(el.uint()),
                ids::DOCTYPEVERSION => header.doctype_version = Some(el.uint()),
                ids::DOCTYPEREADVERSION => header.doctype_read_version = Some(el.uint()),
                ids::DOCTYPE => {
                    let doctype = el.string();
                    self.mkv.doctype = Some(doctype.clone());
                    header.doctype = Some(doctype);
                }
                _ => self.ctx.unhandled("header", &el)?,
            }
        }
        self.mkv.header = Some(header);
        Ok(())
    }

    fn segment(&mut self, parent: &Element) -> Result<ControlFlow<()>> {
        let hide_clusters = self.options.hide_clusters;
        while let Some(el) = self.ctx.next_element(parent.end, DataPolicy::Skip)? {
            if el.id != ids::CLUSTER || !hide_clusters {
                self.mkv.segments.push(span(&el));
            }
            match el.id {
                ids::SEEKHEAD => self.seek_head(&el)?,
                ids::TRACKS => self.tracks(&el)?,
                ids::INFO => self.info(&el)?,
                ids::CUES if hide_clusters => self.ctx.skip_to(el.end),
                ids::CUES => self.cues(&el)?,
                ids::TAGS => self.tags(&el)?,
                ids::ATTACHMENTS => self.attachments(&el)?,
                ids::CHAPTERS => self.chapters(&el)?,
                ids::CLUSTER => {
                    self.cluster(&el)?;
                    if !self.options.parse_whole_file && self.mkv.is_complete() {
                        return Ok(ControlFlow::Break(()));
                    }
                }
                _ => self.ctx.unhandled("segment", &el)?,
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    fn seek_head(&mut self, parent: &Element) -> Result<()> {
        while let Some(seek) = self.ctx.next_element(parent.end, DataPolicy::Skip)? {
            if seek.id != ids::SEEK {
                self.ctx.unhandled("seekhead", &seek)?;
                continue;
            }
            let mut entry = SeekEntry {
                offset: seek.offset,
                length: seek.length,
                ..Default::default()
            };
            while let Some(el) = self.ctx.next_element(seek.end, DataPolicy::All)? {
                match el.id {
                    ids::SEEKID => match el.vint().map(u32::try_from) {
                        Ok(Ok(id)) => {
                            entry.target_id = id;
                            entry.target_name = ids::id_name(id).into_owned();
                        }
                        Ok(Err(_)) => {
                            let err = EbmlError::BadSeekId {
                                offset: el.offset,
                                reason: "ID longer than 4 bytes".into(),
                            };
                            log_or_err!(self.ctx, Level::Warn, err);
                        }
                        Err(e) => {
                            let err = EbmlError::BadSeekId {
                                offset: el.offset,
                                reason: e.to_string(),
                            };
                            log_or_err!(self.ctx, Level::Warn, err);
                        }
                    },
                    ids::SEEKPOSITION => entry.target_offset = parent.offset + el.uint(),
                    _ => self.ctx.unhandled("seekhead.seek", &el)?,
                }
            }
            if entry.target_id != ids::CLUSTER || !self.options.hide_clusters {
                self.mkv.seek.push(entry);
            }
        }
        Ok(())
    }

    fn tracks(&mut self, parent: &Element) -> Result<()> {
        self.mkv.tracks = Some(Tracks {
            offset: parent.offset,
            length: parent.length,
            tracks: Vec::new(),
        });
        while let Some(el) = self.ctx.next_element(parent.end, DataPolicy::Skip)? {
            if el.id != ids::TRACKENTRY {
                self.ctx.unhandled("tracks", &el)?;
                continue;
            }
            let entry = self.track_entry(&el)?;
            if let Some(tracks) = self.mkv.tracks.as_mut() {
                tracks.tracks.push(entry);
            }
        }
        Ok(())
    }

    fn track_entry(&mut self, parent: &Element) -> Result<TrackEntry> {
        const NESTED: &[u32] = &[ids::VIDEO, ids::AUDIO, ids::CONTENTENCODINGS, ids::CODECPRIVATE];

        let mut track = TrackEntry::default();
        while let Some(el) = self.ctx.next_element(parent.end, DataPolicy::Except(NESTED))? {
            match el.id {
                ids::TRACKNUMBER => track.track_number = Some(el.uint()),
                ids::TRACKUID => track.track_uid = Some(el.uint()),
                ids::TRACKTYPE => track.track_type = Some(el.uint()),
                ids::MINCACHE => track.min_cache = Some(el.uint()),
                ids::MAXCACHE => track.max_cache = Some(el.uint()),
                ids::MAXBLOCKADDITIONID => track.max_block_addition_id = Some(el.uint()),
                ids::DEFAULTDURATION => track.default_duration = Some(el.uint()),
                ids::TRACKTIMECODESCALE => track.track_timecode_scale = Some(el.float()),
                ids::CODECID => track.codec_id = Some(el.string()),
                ids::LANGUAGE => track.language = Some(el.string()),
                ids::NAME => track.name = Some(el.string()),
                ids::CODECNAME => track.codec_name = Some(el.string()),
                ids::CODECPRIVATE => track.codec_private = Some(self.ctx.read_bytes(el.length)?),
                ids::FLAGENABLED => track.flag_enabled = Some(el.flag()),
                ids::FLAGDEFAULT => track.flag_default = Some(el.flag()),
                ids::FLAGFORCED => track.flag_forced = Some(el.flag()),
                ids::FLAGLACING => track.flag_lacing = Some(el.flag()),
                ids::CODECDECODEALL => track.codec_decode_all = Some(el.flag()),
                ids::VIDEO => track.video = Some(self.video(&el)?),
                ids::AUDIO => track.audio = Some(self.audio(&el)?),
                ids::CONTENTENCODINGS => track.content_encodings = self.content_encodings(&el)?,
                _ => self.ctx.unhandled("track", &el)?,
            }
        }
        Ok(track)
    }

    fn video(&mut self, parent: &Element) -> Result<VideoSettings> {
        let mut video = VideoSettings::default();
        while let Some(el) = self.ctx.next_element(parent.end, DataPolicy::All)? {
            match el.id {
                ids::PIXELWIDTH => video.pixel_width = Some(el.uint()),
                ids::PIXELHEIGHT => video.pixel_height = Some(el.uint()),
                ids::PIXELCROPBOTTOM => video.pixel_crop_bottom = Some(el.uint()),
                ids::PIXELCROPTOP => video.pixel_crop_top = Some(el.uint()),
                ids::PIXELCROPLEFT => video.pixel_crop_left = Some(el.uint()),
                ids::PIXELCROPRIGHT => video.pixel_crop_right = Some(el.uint()),
                ids::DISPLAYWIDTH => video.display_width = Some(el.uint()),
                ids::DISPLAYHEIGHT => video.display_height = Some(el.uint()),
                ids::DISPLAYUNIT => video.display_unit = Some(el.uint()),
                ids::ASPECTRATIOTYPE => video.aspect_ratio_type = Some(el.uint()),
                ids::STEREOMODE => video.stereo_mode = Some(el.uint()),
                ids::OLDSTEREOMODE => video.old_stereo_mode = Some(el.uint()),
                ids::FLAGINTERLACED => video.flag_interlaced = Some(el.flag()),
                ids::GAMMAVALUE => video.gamma_value = Some(el.float()),
                ids::COLOURSPACE => video.colour_space = Some(el.string()),
                _ => self.ctx.unhandled("track.video", &el)?,
            }
        }
        Ok(video)
    }

    fn audio(&mut self, parent: &Element) -> Result<AudioSettings> {
        let mut audio = AudioSettings::default();
        while let Some(el) = self.ctx.next_element(parent.end, DataPolicy::All)? {
            match el.id {
                ids::CHANNELS => audio.channels = Some(el.uint()),
                ids::BITDEPTH => audio.bit_depth = Some(el.uint()),
                ids::SAMPLINGFREQUENCY => audio.sampling_frequency = Some(el.float()),
                ids::OUTPUTSAMPLINGFREQUENCY => audio.output_sampling_frequency = Some(el.float()),
                ids::CHANNELPOSITIONS => audio.channel_positions = Some(el.string()),
                _ => self.ctx.unhandled("track.audio", &el)?,
            }
        }
        Ok(audio)
    }

    fn content_encodings(&mut self, parent: &Element) -> Result<Vec<ContentEncoding>> {
        const NESTED: &[u32] = &[ids::CONTENTCOMPRESSION, ids::CONTENTENCRYPTION];

        let mut encodings = Vec::new();
        while let Some(encoding) = self.ctx.next_element(parent.end, DataPolicy::Skip)? {
            if encoding.id != ids::CONTENTENCODING {
                self.ctx.unhandled("track.contentencodings", &encoding)?;
                continue;
            }
            let mut entry = ContentEncoding::default();
            while let Some(el) = self
                .ctx
                .next_element(encoding.end, DataPolicy::Except(NESTED))?
            {
                match el.id {
                    ids::CONTENTENCODINGORDER => entry.content_encoding_order = Some(el.uint()),
                    ids::CONTENTENCODINGSCOPE => entry.content_encoding_scope = Some(el.uint()),
                    ids::CONTENTENCODINGTYPE => entry.content_encoding_type = Some(el.uint()),
                    ids::CONTENTCOMPRESSION => {
                        let mut compression = ContentCompression::default();
                        while let Some(sub) = self.ctx.next_element(el.end, DataPolicy::All)? {
                            match sub.id {
                                ids::CONTENTCOMPALGO => {
                                    compression.content_comp_algo = Some(sub.uint())
                                }
                                ids::CONTENTCOMPSETTINGS => {
                                    compression.content_comp_settings = sub.data
                                }
                                _ => self.ctx.unhandled(
                                    "track.contentencodings.contentencoding.contentcompression",
                                    &sub,
                                )?,
                            }
                        }
                        entry.content_compression = Some(compression);
                    }
                    ids::CONTENTENCRYPTION => {
                        let mut encryption = ContentEncryption::default();
                        while let Some(sub) = self.ctx.next_element(el.end, DataPolicy::All)? {
                            match sub.id {
                                ids::CONTENTENCALGO => encryption.content_enc_algo = Some(sub.uint()),
                                ids::CONTENTSIGALGO => encryption.content_sig_algo = Some(sub.uint()),
                                ids::CONTENTSIGHASHALGO => {
                                    encryption.content_sig_hash_algo = Some(sub.uint())
                                }
                                ids::CONTENTENCKEYID => encryption.content_enc_key_id = sub.data,
                                ids::CONTENTSIGNATURE => encryption.content_signature = sub.data,
                                ids::CONTENTSIGKEYID => encryption.content_sig_key_id = sub.data,
                                _ => self.ctx.unhandled(
                                    "track.contentencodings.contentencoding.contentencryption",
                                    &sub,
                                )?,
                            }
                        }
                        entry.content_encryption = Some(encryption);
                    }
                    _ => self
                        .ctx
                        .unhandled("track.contentencodings.contentencoding", &el)?,
                }
            }
            encodings.push(entry);
        }
        Ok(encodings)
    }

    fn info(&mut self, parent: &Element) -> Result<()> {
        let mut info = InfoEntry::default();
        while let Some(el) = self
            .ctx
            .next_element(parent.end, DataPolicy::Except(&[ids::CHAPTERTRANSLATE]))?
        {
            match el.id {
                ids::TIMECODESCALE => info.timecode_scale = Some(el.uint()),
                ids::DURATION => info.duration = Some(el.float()),
                ids::DATEUTC => {
                    let date = el.int();
                    info.date_utc = Some(date);
                    info.date_utc_unix = Some(ebml_date_to_unix(date));
                }
                ids::SEGMENTUID => info.segment_uid = Some(hex_string(el.bytes())),
                ids::PREVUID => info.prev_uid = Some(hex_string(el.bytes())),
                ids::NEXTUID => info.next_uid = Some(hex_string(el.bytes())),
                ids::SEGMENTFAMILY => info.segment_family.push(hex_string(el.bytes())),
                ids::SEGMENTFILENAME
                | ids::PREVFILENAME
                | ids::NEXTFILENAME
                | ids::TITLE
                | ids::MUXINGAPP
                | ids::WRITINGAPP => {
                    let value = el.string();
                    self.mkv
                        .comments
                        .entry(el.id_name.to_lowercase())
                        .or_default()
                        .push(CommentValue::Text(value.clone()));
                    let slot = match el.id {
                        ids::SEGMENTFILENAME => &mut info.segment_filename,
                        ids::PREVFILENAME => &mut info.prev_filename,
                        ids::NEXTFILENAME => &mut info.next_filename,
                        ids::TITLE => &mut info.title,
                        ids::MUXINGAPP => &mut info.muxing_app,
                        _ => &mut info.writing_app,
                    };
                    *slot = Some(value);
                }
                ids::CHAPTERTRANSLATE => {
                    let mut translate = ChapterTranslate::default();
                    while let Some(sub) = self.ctx.next_element(el.end, DataPolicy::All)? {
                        match sub.id {
                            ids::CHAPTERTRANSLATEEDITIONUID => {
                                translate.chapter_translate_edition_uid.push(sub.uint())
                            }
                            ids::CHAPTERTRANSLATECODEC => {
                                translate.chapter_translate_codec = Some(sub.uint())
                            }
                            ids::CHAPTERTRANSLATEID => {
                                translate.chapter_translate_id = Some(hex_string(sub.bytes()))
                            }
                            _ => self.ctx.unhandled("info.chaptertranslate", &sub)?,
                        }
                    }
                    info.chapter_translate = Some(translate);
                }
                _ => self.ctx.unhandled("info", &el)?,
            }
        }
        self.mkv.info.push(info);
        Ok(())
    }

    fn cues(&mut self, parent: &Element) -> Result<()> {
        while let Some(point) = self.ctx.next_element(parent.end, DataPolicy::Skip)? {
            if point.id != ids::CUEPOINT {
                self.ctx.unhandled("cues", &point)?;
                continue;
            }
            let mut cue = CuePoint::default();
            while let Some(el) = self
                .ctx
                .next_element(point.end, DataPolicy::Except(&[ids::CUETRACKPOSITIONS]))?
            {
                match el.id {
                    ids::CUETIME => cue.cue_time = Some(el.uint()),
                    ids::CUETRACKPOSITIONS => {
                        let mut positions = CueTrackPositions::default();
                        while let Some(sub) = self.ctx.next_element(el.end, DataPolicy::All)? {
                            match sub.id {
                                ids::CUETRACK => positions.cue_track = Some(sub.uint()),
                                ids::CUECLUSTERPOSITION => {
                                    positions.cue_cluster_position = Some(sub.uint())
                                }
                                ids::CUEBLOCKNUMBER => positions.cue_block_number = Some(sub.uint()),
                                ids::CUECODECSTATE => positions.cue_codec_state = Some(sub.uint()),
                                _ => self.ctx.unhandled("cues.cuepoint.cuetrackpositions", &sub)?,
                            }
                        }
                        cue.cue_track_positions.push(positions);
                    }
                    _ => self.ctx.unhandled("cues.cuepoint", &el)?,
                }
            }
            self.mkv.cues.push(cue);
        }
        Ok(())
    }

    fn tags(&mut self, parent: &Element) -> Result<()> {
        while let Some(tag_el) = self.ctx.next_element(parent.end, DataPolicy::Skip)? {
            if tag_el.id != ids::TAG {
                self.ctx.unhandled("tags", &tag_el)?;
                continue;
            }
            let mut tag = Tag::default();
            while let Some(el) = self.ctx.next_element(tag_el.end, DataPolicy::Skip)? {
                match el.id {
                    ids::TARGETS => tag.targets = Some(self.targets(&el)?),
                    ids::SIMPLETAG => tag.simple_tag.push(self.simple_tag(&el)?),
                    _ => self.ctx.unhandled("tags.tag", &el)?,
                }
            }
            self.mkv.tags.push(tag);
        }
        Ok(())
    }

    fn targets(&mut self, parent: &Element) -> Result<Targets> {
        let mut targets = Targets::default();
        while let Some(el) = self.ctx.next_element(parent.end, DataPolicy::All)? {
            match el.id {
                ids::TARGETTYPEVALUE => {
                    targets.target_type_value = Some(el.uint());
                    targets.target_type_value_long = Some(target_type_value(el.uint()));
                }
                ids::TARGETTYPE => targets.target_type = Some(el.string()),
                ids::TAGTRACKUID => targets.tag_track_uid.push(el.uint()),
                ids::TAGEDITIONUID => targets.tag_edition_uid.push(el.uint()),
                ids::TAGCHAPTERUID => targets.tag_chapter_uid.push(el.uint()),
                ids::TAGATTACHMENTUID => targets.tag_attachment_uid.push(el.uint()),
                _ => self.ctx.unhandled("tags.tag.targets", &el)?,
            }
        }
        Ok(targets)
    }

    fn simple_tag(&mut self, parent: &Element) -> Result<SimpleTag> {
        let mut tag = SimpleTag::default();
        while let Some(el) = self
            .ctx
            .next_element(parent.end, DataPolicy::Except(&[ids::SIMPLETAG]))?
        {
            match el.id {
                ids::TAGNAME => tag.tag_name = Some(el.string()),
                ids::TAGLANGUAGE => tag.tag_language = Some(el.string()),
                ids::TAGSTRING => tag.tag_string = Some(el.string()),
                ids::TAGBINARY => tag.tag_binary = el.data,
                ids::TAGDEFAULT => tag.tag_default = Some(el.flag()),
                ids::SIMPLETAG => tag.simple_tag.push(self.simple_tag(&el)?),
                _ => self.ctx.unhandled("tag.simpletag", &el)?,
            }
        }
        Ok(tag)
    }

    fn attachments(&mut self, parent: &Element) -> Result<()> {
        while let Some(file_el) = self.ctx.next_element(parent.end, DataPolicy::Skip)? {
            if file_el.id != ids::ATTACHEDFILE {
                self.ctx.unhandled("attachments", &file_el)?;
                continue;
            }
            let mut file = AttachedFile::default();
            while let Some(el) = self
                .ctx
                .next_element(file_el.end, DataPolicy::Except(&[ids::FILEDATA]))?
            {
                match el.id {
                    ids::FILEDESCRIPTION => file.file_description = Some(el.string()),
                    ids::FILENAME => file.file_name = Some(el.string()),
                    ids::FILEMIMETYPE => file.file_mime_type = Some(el.string()),
                    ids::FILEUID => file.file_uid = Some(el.uint()),
                    ids::FILEDATA => {
                        let offset = self.ctx.offset();
                        file.data_offset = Some(offset);
                        file.data_length = Some(el.length);
                        let name = file.file_name.clone().unwrap_or_else(|| "attachment".into());
                        match save_attachment(
                            self.ctx.source_mut(),
                            self.options,
                            &name,
                            offset,
                            el.length,
                            None,
                        ) {
                            Ok(data) => file.file_data = data,
                            Err(e) => self
                                .ctx
                                .warn(format!("Failed to extract attachment {name}: {e}")),
                        }
                        self.ctx.skip_to(el.end);
                    }
                    _ => self.ctx.unhandled("attachments.attachedfile", &el)?,
                }
            }
            self.mkv.attachments.push(file);
        }
        Ok(())
    }

    fn chapters(&mut self, parent: &Element) -> Result<()> {
        while let Some(edition_el) = self.ctx.next_element(parent.end, DataPolicy::Skip)? {
            if edition_el.id != ids::EDITIONENTRY {
                self.ctx.unhandled("chapters", &edition_el)?;
                continue;
            }
            let mut edition = EditionEntry::default();
            while let Some(el) = self
                .ctx
                .next_element(edition_el.end, DataPolicy::Except(&[ids::CHAPTERATOM]))?
            {
                match el.id {
                    ids::EDITIONUID => edition.edition_uid = Some(el.uint()),
                    ids::EDITIONFLAGHIDDEN => edition.edition_flag_hidden = Some(el.flag()),
                    ids::EDITIONFLAGDEFAULT => edition.edition_flag_default = Some(el.flag()),
                    ids::EDITIONFLAGORDERED => edition.edition_flag_ordered = Some(el.flag()),
                    ids::CHAPTERATOM => edition.chapter_atom.push(self.chapter_atom(&el)?),
                    _ => self.ctx.unhandled("chapters.editionentry", &el)?,
                }
            }
            self.mkv.chapters.push(edition);
        }
        Ok(())
    }

    fn chapter_atom(&mut self, parent: &Element) -> Result<ChapterAtom> {
        const NESTED: &[u32] = &[ids::CHAPTERTRACK, ids::CHAPTERDISPLAY];

        let mut atom = ChapterAtom::default();
        while let Some(el) = self.ctx.next_element(parent.end, DataPolicy::Except(NESTED))? {
            match el.id {
                ids::CHAPTERUID => atom.chapter_uid = Some(el.uint()),
                ids::CHAPTERTIMESTART => atom.chapter_time_start = Some(el.uint()),
                ids::CHAPTERTIMEEND => atom.chapter_time_end = Some(el.uint()),
                ids::CHAPTERFLAGENABLED => atom.chapter_flag_enabled = Some(el.flag()),
                ids::CHAPTERFLAGHIDDEN => atom.chapter_flag_hidden = Some(el.flag()),
                ids::CHAPTERSEGMENTUID => atom.chapter_segment_uid = Some(hex_string(el.bytes())),
                ids::CHAPTERSEGMENTEDITIONUID => {
                    atom.chapter_segment_edition_uid = Some(hex_string(el.bytes()))
                }
                ids::CHAPTERTRACK => {
                    let mut track = ChapterTrack::default();
                    while let Some(sub) = self.ctx.next_element(el.end, DataPolicy::All)? {
                        match sub.id {
                            ids::CHAPTERTRACKNUMBER => track.chapter_track_number.push(sub.uint()),
                            _ => self
                                .ctx
                                .unhandled("chapters.editionentry.chapteratom.chaptertrack", &sub)?,
                        }
                    }
                    atom.chapter_track.push(track);
                }
                ids::CHAPTERDISPLAY => {
                    let mut display = ChapterDisplay::default();
                    while let Some(sub) = self.ctx.next_element(el.end, DataPolicy::All)? {
                        match sub.id {
                            ids::CHAPSTRING => display.chap_string = Some(sub.string()),
                            ids::CHAPLANGUAGE => display.chap_language = Some(sub.string()),
                            ids::CHAPCOUNTRY => display.chap_country = Some(sub.string()),
                            _ => self
                                .ctx
                                .unhandled("chapters.editionentry.chapteratom.chapterdisplay", &sub)?,
                        }
                    }
                    atom.chapter_display.push(display);
                }
                _ => self.ctx.unhandled("chapters.editionentry.chapteratom", &el)?,
            }
        }
        Ok(atom)
    }

    fn cluster(&mut self, parent: &Element) -> Result<()> {
        const NESTED: &[u32] = &[
            ids::CLUSTERSILENTTRACKS,
            ids::CLUSTERBLOCKGROUP,
            ids::CLUSTERSIMPLEBLOCK,
        ];

        let mut cluster = Cluster::default();
        while let Some(el) = self.ctx.next_element(parent.end, DataPolicy::Except(NESTED))? {
            match el.id {
                ids::CLUSTERTIMECODE => cluster.timecode = Some(el.uint()),
                ids::CLUSTERPOSITION => cluster.position = Some(el.uint()),
                ids::CLUSTERPREVSIZE => cluster.prev_size = Some(el.uint()),
                ids::CLUSTERSILENTTRACKS => {
                    let mut silent = Vec::new();
                    while let Some(sub) = self.ctx.next_element(el.end, DataPolicy::All)? {
                        match sub.id {
                            ids::CLUSTERSILENTTRACKNUMBER => silent.push(sub.uint()),
                            _ => self.ctx.unhandled("cluster.silenttracks", &sub)?,
                        }
                    }
                    cluster.silent_tracks.push(silent);
                }
                ids::CLUSTERBLOCKGROUP => {
                    let group = self.block_group(&el)?;
                    cluster.block_group.push(group);
                }
                ids::CLUSTERSIMPLEBLOCK => {
                    let block = self.block(&el, true)?;
                    cluster.simple_block.push(block);
                }
                _ => self.ctx.unhandled("cluster", &el)?,
            }
            self.ctx.skip_to(el.end);
        }
        if !self.options.hide_clusters {
            self.mkv.cluster.push(cluster);
        }
        Ok(())
    }

    fn block_group(&mut self, parent: &Element) -> Result<BlockGroup> {
        let mut group = BlockGroup {
            offset: self.ctx.offset(),
            ..Default::default()
        };
        while let Some(el) = self
            .ctx
            .next_element(parent.end, DataPolicy::Except(&[ids::CLUSTERBLOCK]))?
        {
            match el.id {
                ids::CLUSTERBLOCK => group.block = Some(self.block(&el, false)?),
                ids::CLUSTERREFERENCEPRIORITY => group.reference_priority = Some(el.uint()),
                ids::CLUSTERBLOCKDURATION => group.block_duration = Some(el.uint()),
                ids::CLUSTERREFERENCEBLOCK => group.reference_block.push(el.int()),
                ids::CLUSTERCODECSTATE => group.codec_state = Some(el.string()),
                _ => self.ctx.unhandled("clusters.blockgroup", &el)?,
            }
        }
        Ok(group)
    }

    /// Reads a block header and records where the first block of its track
    /// starts. The cursor is left at the end of the block.
    fn block(&mut self, el: &Element, simple: bool) -> Result<Block> {
        let block = Block::read(self.ctx, el, simple)?;
        self.mkv
            .track_data_offsets
            .entry(block.tracknumber)
            .or_insert(DataOffset {
                offset: block.data_offset,
                length: el.end.saturating_sub(block.data_offset),
            });
        self.ctx.skip_to(el.end);
        Ok(block)
    }
}

fn span(el: &Element) -> ElementSpan {
    ElementSpan {
        id: el.id,
        id_name: el.id_name.to_string(),
        offset: el.offset,
        length: el.length,
    }
}
