//! Matroska element IDs, stored with the vint length marker removed.

use std::borrow::Cow;

pub const CHAPTERS: u32 = 0x43A770;
pub const SEEKHEAD: u32 = 0x14D9B74;
pub const TAGS: u32 = 0x254C367;
pub const INFO: u32 = 0x549A966;
pub const TRACKS: u32 = 0x654AE6B;
pub const SEGMENT: u32 = 0x8538067;
pub const ATTACHMENTS: u32 = 0x941A469;
pub const EBML: u32 = 0xA45DFA3;
pub const CUES: u32 = 0xC53BB6B;
pub const CLUSTER: u32 = 0xF43B675;
pub const LANGUAGE: u32 = 0x2B59C;
pub const TRACKTIMECODESCALE: u32 = 0x3314F;
pub const DEFAULTDURATION: u32 = 0x3E383;
pub const CODECNAME: u32 = 0x58688;
pub const CODECDOWNLOADURL: u32 = 0x6B240;
pub const TIMECODESCALE: u32 = 0xAD7B1;
pub const COLOURSPACE: u32 = 0xEB524;
pub const GAMMAVALUE: u32 = 0xFB523;
pub const CODECSETTINGS: u32 = 0x1A9697;
pub const CODECINFOURL: u32 = 0x1B4040;
pub const PREVFILENAME: u32 = 0x1C83AB;
pub const PREVUID: u32 = 0x1CB923;
pub const NEXTFILENAME: u32 = 0x1E83BB;
pub const NEXTUID: u32 = 0x1EB923;
pub const CONTENTCOMPALGO: u32 = 0x254;
pub const CONTENTCOMPSETTINGS: u32 = 0x255;
pub const DOCTYPE: u32 = 0x282;
pub const DOCTYPEREADVERSION: u32 = 0x285;
pub const EBMLVERSION: u32 = 0x286;
pub const DOCTYPEVERSION: u32 = 0x287;
pub const EBMLMAXIDLENGTH: u32 = 0x2F2;
pub const EBMLMAXSIZELENGTH: u32 = 0x2F3;
pub const EBMLREADVERSION: u32 = 0x2F7;
pub const CHAPLANGUAGE: u32 = 0x37C;
pub const CHAPCOUNTRY: u32 = 0x37E;
pub const SEGMENTFAMILY: u32 = 0x444;
pub const DATEUTC: u32 = 0x461;
pub const TAGLANGUAGE: u32 = 0x47A;
pub const TAGDEFAULT: u32 = 0x484;
pub const TAGBINARY: u32 = 0x485;
pub const TAGSTRING: u32 = 0x487;
pub const DURATION: u32 = 0x489;
pub const CHAPPROCESSPRIVATE: u32 = 0x50D;
pub const CHAPTERFLAGENABLED: u32 = 0x598;
pub const TAGNAME: u32 = 0x5A3;
pub const EDITIONENTRY: u32 = 0x5B9;
pub const EDITIONUID: u32 = 0x5BC;
pub const EDITIONFLAGHIDDEN: u32 = 0x5BD;
pub const EDITIONFLAGDEFAULT: u32 = 0x5DB;
pub const EDITIONFLAGORDERED: u32 = 0x5DD;
pub const FILEDATA: u32 = 0x65C;
pub const FILEMIMETYPE: u32 = 0x660;
pub const FILENAME: u32 = 0x66E;
pub const FILEREFERRAL: u32 = 0x675;
pub const FILEDESCRIPTION: u32 = 0x67E;
pub const FILEUID: u32 = 0x6AE;
pub const CONTENTENCALGO: u32 = 0x7E1;
pub const CONTENTENCKEYID: u32 = 0x7E2;
pub const CONTENTSIGNATURE: u32 = 0x7E3;
pub const CONTENTSIGKEYID: u32 = 0x7E4;
pub const CONTENTSIGALGO: u32 = 0x7E5;
pub const CONTENTSIGHASHALGO: u32 = 0x7E6;
pub const MUXINGAPP: u32 = 0xD80;
pub const SEEK: u32 = 0xDBB;
pub const CONTENTENCODINGORDER: u32 = 0x1031;
pub const CONTENTENCODINGSCOPE: u32 = 0x1032;
pub const CONTENTENCODINGTYPE: u32 = 0x1033;
pub const CONTENTCOMPRESSION: u32 = 0x1034;
pub const CONTENTENCRYPTION: u32 = 0x1035;
pub const CUEREFNUMBER: u32 = 0x135F;
pub const NAME: u32 = 0x136E;
pub const CUEBLOCKNUMBER: u32 = 0x1378;
pub const TRACKOFFSET: u32 = 0x137F;
pub const SEEKID: u32 = 0x13AB;
pub const SEEKPOSITION: u32 = 0x13AC;
pub const STEREOMODE: u32 = 0x13B8;
pub const OLDSTEREOMODE: u32 = 0x13B9;
pub const PIXELCROPBOTTOM: u32 = 0x14AA;
pub const DISPLAYWIDTH: u32 = 0x14B0;
pub const DISPLAYUNIT: u32 = 0x14B2;
pub const ASPECTRATIOTYPE: u32 = 0x14B3;
pub const DISPLAYHEIGHT: u32 = 0x14BA;
pub const PIXELCROPTOP: u32 = 0x14BB;
pub const PIXELCROPLEFT: u32 = 0x14CC;
pub const PIXELCROPRIGHT: u32 = 0x14DD;
pub const FLAGFORCED: u32 = 0x15AA;
pub const MAXBLOCKADDITIONID: u32 = 0x15EE;
pub const WRITINGAPP: u32 = 0x1741;
pub const CLUSTERSILENTTRACKS: u32 = 0x1854;
pub const CLUSTERSILENTTRACKNUMBER: u32 = 0x18D7;
pub const ATTACHEDFILE: u32 = 0x21A7;
pub const CONTENTENCODING: u32 = 0x2240;
pub const BITDEPTH: u32 = 0x2264;
pub const CODECPRIVATE: u32 = 0x23A2;
pub const TARGETS: u32 = 0x23C0;
pub const CHAPTERPHYSICALEQUIV: u32 = 0x23C3;
pub const TAGCHAPTERUID: u32 = 0x23C4;
pub const TAGTRACKUID: u32 = 0x23C5;
pub const TAGATTACHMENTUID: u32 = 0x23C6;
pub const TAGEDITIONUID: u32 = 0x23C9;
pub const TARGETTYPE: u32 = 0x23CA;
pub const TRACKTRANSLATE: u32 = 0x2624;
pub const TRACKTRANSLATETRACKID: u32 = 0x26A5;
pub const TRACKTRANSLATECODEC: u32 = 0x26BF;
pub const TRACKTRANSLATEEDITIONUID: u32 = 0x26FC;
pub const SIMPLETAG: u32 = 0x27C8;
pub const TARGETTYPEVALUE: u32 = 0x28CA;
pub const CHAPPROCESSCOMMAND: u32 = 0x2911;
pub const CHAPPROCESSTIME: u32 = 0x2922;
pub const CHAPTERTRANSLATE: u32 = 0x2924;
pub const CHAPPROCESSDATA: u32 = 0x2933;
pub const CHAPPROCESS: u32 = 0x2944;
pub const CHAPPROCESSCODECID: u32 = 0x2955;
pub const CHAPTERTRANSLATEID: u32 = 0x29A5;
pub const CHAPTERTRANSLATECODEC: u32 = 0x29BF;
pub const CHAPTERTRANSLATEEDITIONUID: u32 = 0x29FC;
pub const CONTENTENCODINGS: u32 = 0x2D80;
pub const MINCACHE: u32 = 0x2DE7;
pub const MAXCACHE: u32 = 0x2DF8;
pub const CHAPTERSEGMENTUID: u32 = 0x2E67;
pub const CHAPTERSEGMENTEDITIONUID: u32 = 0x2EBC;
pub const TRACKOVERLAY: u32 = 0x2FAB;
pub const TAG: u32 = 0x3373;
pub const SEGMENTFILENAME: u32 = 0x3384;
pub const SEGMENTUID: u32 = 0x33A4;
pub const CHAPTERUID: u32 = 0x33C4;
pub const TRACKUID: u32 = 0x33C5;
pub const ATTACHMENTLINK: u32 = 0x3446;
pub const CLUSTERBLOCKADDITIONS: u32 = 0x35A1;
pub const CHANNELPOSITIONS: u32 = 0x347B;
pub const OUTPUTSAMPLINGFREQUENCY: u32 = 0x38B5;
pub const TITLE: u32 = 0x3BA9;
pub const CHAPTERDISPLAY: u32 = 0x0;
pub const TRACKTYPE: u32 = 0x3;
pub const CHAPSTRING: u32 = 0x5;
pub const CODECID: u32 = 0x6;
pub const FLAGDEFAULT: u32 = 0x8;
pub const CHAPTERTRACKNUMBER: u32 = 0x9;
pub const CLUSTERSLICES: u32 = 0xE;
pub const CHAPTERTRACK: u32 = 0xF;
pub const CHAPTERTIMESTART: u32 = 0x11;
pub const CHAPTERTIMEEND: u32 = 0x12;
pub const CUEREFTIME: u32 = 0x16;
pub const CUEREFCLUSTER: u32 = 0x17;
pub const CHAPTERFLAGHIDDEN: u32 = 0x18;
pub const FLAGINTERLACED: u32 = 0x1A;
pub const CLUSTERBLOCKDURATION: u32 = 0x1B;
pub const FLAGLACING: u32 = 0x1C;
pub const CHANNELS: u32 = 0x1F;
pub const CLUSTERBLOCKGROUP: u32 = 0x20;
pub const CLUSTERBLOCK: u32 = 0x21;
pub const CLUSTERBLOCKVIRTUAL: u32 = 0x22;
pub const CLUSTERSIMPLEBLOCK: u32 = 0x23;
pub const CLUSTERCODECSTATE: u32 = 0x24;
pub const CLUSTERBLOCKADDITIONAL: u32 = 0x25;
pub const CLUSTERBLOCKMORE: u32 = 0x26;
pub const CLUSTERPOSITION: u32 = 0x27;
pub const CODECDECODEALL: u32 = 0x2A;
pub const CLUSTERPREVSIZE: u32 = 0x2B;
pub const TRACKENTRY: u32 = 0x2E;
pub const CLUSTERENCRYPTEDBLOCK: u32 = 0x2F;
pub const PIXELWIDTH: u32 = 0x30;
pub const CUETIME: u32 = 0x33;
pub const SAMPLINGFREQUENCY: u32 = 0x35;
pub const CHAPTERATOM: u32 = 0x36;
pub const CUETRACKPOSITIONS: u32 = 0x37;
pub const FLAGENABLED: u32 = 0x39;
pub const PIXELHEIGHT: u32 = 0x3A;
pub const CUEPOINT: u32 = 0x3B;
pub const CRC32: u32 = 0x3F;
pub const CLUSTERBLOCKADDITIONID: u32 = 0x4B;
pub const CLUSTERLACENUMBER: u32 = 0x4C;
pub const CLUSTERFRAMENUMBER: u32 = 0x4D;
pub const CLUSTERDELAY: u32 = 0x4E;
pub const CLUSTERDURATION: u32 = 0x4F;
pub const TRACKNUMBER: u32 = 0x57;
pub const CUEREFERENCE: u32 = 0x5B;
pub const VIDEO: u32 = 0x60;
pub const AUDIO: u32 = 0x61;
pub const CLUSTERTIMESLICE: u32 = 0x68;
pub const CUECODECSTATE: u32 = 0x6A;
pub const CUEREFCODECSTATE: u32 = 0x6B;
pub const VOID: u32 = 0x6C;
pub const CLUSTERTIMECODE: u32 = 0x67;
pub const CLUSTERBLOCKADDID: u32 = 0x6E;
pub const CUECLUSTERPOSITION: u32 = 0x71;
pub const CUETRACK: u32 = 0x77;
pub const CLUSTERREFERENCEPRIORITY: u32 = 0x7A;
pub const CLUSTERREFERENCEBLOCK: u32 = 0x7B;
pub const CLUSTERREFERENCEVIRTUAL: u32 = 0x7D;

/// Element names sorted by ID.
static NAMES: &[(u32, &str)] = &[
    (CHAPTERDISPLAY, "ChapterDisplay"),
    (TRACKTYPE, "TrackType"),
    (CHAPSTRING, "ChapString"),
    (CODECID, "CodecID"),
    (FLAGDEFAULT, "FlagDefault"),
    (CHAPTERTRACKNUMBER, "ChapterTrackNumber"),
    (CLUSTERSLICES, "ClusterSlices"),
    (CHAPTERTRACK, "ChapterTrack"),
    (CHAPTERTIMESTART, "ChapterTimeStart"),
    (CHAPTERTIMEEND, "ChapterTimeEnd"),
    (CUEREFTIME, "CueRefTime"),
    (CUEREFCLUSTER, "CueRefCluster"),
    (CHAPTERFLAGHIDDEN, "ChapterFlagHidden"),
    (FLAGINTERLACED, "FlagInterlaced"),
    (CLUSTERBLOCKDURATION, "ClusterBlockDuration"),
    (FLAGLACING, "FlagLacing"),
    (CHANNELS, "Channels"),
    (CLUSTERBLOCKGROUP, "ClusterBlockGroup"),
    (CLUSTERBLOCK, "ClusterBlock"),
    (CLUSTERBLOCKVIRTUAL, "ClusterBlockVirtual"),
    (CLUSTERSIMPLEBLOCK, "ClusterSimpleBlock"),
    (CLUSTERCODECSTATE, "ClusterCodecState"),
    (CLUSTERBLOCKADDITIONAL, "ClusterBlockAdditional"),
    (CLUSTERBLOCKMORE, "ClusterBlockMore"),
    (CLUSTERPOSITION, "ClusterPosition"),
    (CODECDECODEALL, "CodecDecodeAll"),
    (CLUSTERPREVSIZE, "ClusterPrevSize"),
    (TRACKENTRY, "TrackEntry"),
    (CLUSTERENCRYPTEDBLOCK, "ClusterEncryptedBlock"),
    (PIXELWIDTH, "PixelWidth"),
    (CUETIME, "CueTime"),
    (SAMPLINGFREQUENCY, "SamplingFrequency"),
    (CHAPTERATOM, "ChapterAtom"),
    (CUETRACKPOSITIONS, "CueTrackPositions"),
    (FLAGENABLED, "FlagEnabled"),
    (PIXELHEIGHT, "PixelHeight"),
    (CUEPOINT, "CuePoint"),
    (CRC32, "CRC32"),
    (CLUSTERBLOCKADDITIONID, "ClusterBlockAdditionID"),
    (CLUSTERLACENUMBER, "ClusterLaceNumber"),
    (CLUSTERFRAMENUMBER, "ClusterFrameNumber"),
    (CLUSTERDELAY, "ClusterDelay"),
    (CLUSTERDURATION, "ClusterDuration"),
    (TRACKNUMBER, "TrackNumber"),
    (CUEREFERENCE, "CueReference"),
    (VIDEO, "Video"),
    (AUDIO, "Audio"),
    (CLUSTERTIMECODE, "ClusterTimecode"),
    (CLUSTERTIMESLICE, "ClusterTimeSlice"),
    (CUECODECSTATE, "CueCodecState"),
    (CUEREFCODECSTATE, "CueRefCodecState"),
    (VOID, "Void"),
    (CLUSTERBLOCKADDID, "ClusterBlockAddID"),
    (CUECLUSTERPOSITION, "CueClusterPosition"),
    (CUETRACK, "CueTrack"),
    (CLUSTERREFERENCEPRIORITY, "ClusterReferencePriority"),
    (CLUSTERREFERENCEBLOCK, "ClusterReferenceBlock"),
    (CLUSTERREFERENCEVIRTUAL, "ClusterReferenceVirtual"),
    (CONTENTCOMPALGO, "ContentCompAlgo"),
    (CONTENTCOMPSETTINGS, "ContentCompSettings"),
    (DOCTYPE, "DocType"),
    (DOCTYPEREADVERSION, "DocTypeReadVersion"),
    (EBMLVERSION, "EBMLVersion"),
    (DOCTYPEVERSION, "DocTypeVersion"),
    (EBMLMAXIDLENGTH, "EBMLMaxIDLength"),
    (EBMLMAXSIZELENGTH, "EBMLMaxSizeLength"),
    (EBMLREADVERSION, "EBMLReadVersion"),
    (CHAPLANGUAGE, "ChapLanguage"),
    (CHAPCOUNTRY, "ChapCountry"),
    (SEGMENTFAMILY, "SegmentFamily"),
    (DATEUTC, "DateUTC"),
    (TAGLANGUAGE, "TagLanguage"),
    (TAGDEFAULT, "TagDefault"),
    (TAGBINARY, "TagBinary"),
    (TAGSTRING, "TagString"),
    (DURATION, "Duration"),
    (CHAPPROCESSPRIVATE, "ChapProcessPrivate"),
    (CHAPTERFLAGENABLED, "ChapterFlagEnabled"),
    (TAGNAME, "TagName"),
    (EDITIONENTRY, "EditionEntry"),
    (EDITIONUID, "EditionUID"),
    (EDITIONFLAGHIDDEN, "EditionFlagHidden"),
    (EDITIONFLAGDEFAULT, "EditionFlagDefault"),
    (EDITIONFLAGORDERED, "EditionFlagOrdered"),
    (FILEDATA, "FileData"),
    (FILEMIMETYPE, "FileMimeType"),
    (FILENAME, "FileName"),
    (FILEREFERRAL, "FileReferral"),
    (FILEDESCRIPTION, "FileDescription"),
    (FILEUID, "FileUID"),
    (CONTENTENCALGO, "ContentEncAlgo"),
    (CONTENTENCKEYID, "ContentEncKeyID"),
    (CONTENTSIGNATURE, "ContentSignature"),
    (CONTENTSIGKEYID, "ContentSigKeyID"),
    (CONTENTSIGALGO, "ContentSigAlgo"),
    (CONTENTSIGHASHALGO, "ContentSigHashAlgo"),
    (MUXINGAPP, "MuxingApp"),
    (SEEK, "Seek"),
    (CONTENTENCODINGORDER, "ContentEncodingOrder"),
    (CONTENTENCODINGSCOPE, "ContentEncodingScope"),
    (CONTENTENCODINGTYPE, "ContentEncodingType"),
    (CONTENTCOMPRESSION, "ContentCompression"),
    (CONTENTENCRYPTION, "ContentEncryption"),
    (CUEREFNUMBER, "CueRefNumber"),
    (NAME, "Name"),
    (CUEBLOCKNUMBER, "CueBlockNumber"),
    (TRACKOFFSET, "TrackOffset"),
    (SEEKID, "SeekID"),
    (SEEKPOSITION, "SeekPosition"),
    (STEREOMODE, "StereoMode"),
    (OLDSTEREOMODE, "OldStereoMode"),
    (PIXELCROPBOTTOM, "PixelCropBottom"),
    (DISPLAYWIDTH, "DisplayWidth"),
    (DISPLAYUNIT, "DisplayUnit"),
    (ASPECTRATIOTYPE, "AspectRatioType"),
    (DISPLAYHEIGHT, "DisplayHeight"),
    (PIXELCROPTOP, "PixelCropTop"),
    (PIXELCROPLEFT, "PixelCropLeft"),
    (PIXELCROPRIGHT, "PixelCropRight"),
    (FLAGFORCED, "FlagForced"),
    (MAXBLOCKADDITIONID, "MaxBlockAdditionID"),
    (WRITINGAPP, "WritingApp"),
    (CLUSTERSILENTTRACKS, "ClusterSilentTracks"),
    (CLUSTERSILENTTRACKNUMBER, "ClusterSilentTrackNumber"),
    (ATTACHEDFILE, "AttachedFile"),
    (CONTENTENCODING, "ContentEncoding"),
    (BITDEPTH, "BitDepth"),
    (CODECPRIVATE, "CodecPrivate"),
    (TARGETS, "Targets"),
    (CHAPTERPHYSICALEQUIV, "ChapterPhysicalEquiv"),
    (TAGCHAPTERUID, "TagChapterUID"),
    (TAGTRACKUID, "TagTrackUID"),
    (TAGATTACHMENTUID, "TagAttachmentUID"),
    (TAGEDITIONUID, "TagEditionUID"),
    (TARGETTYPE, "TargetType"),
    (TRACKTRANSLATE, "TrackTranslate"),
    (TRACKTRANSLATETRACKID, "TrackTranslateTrackID"),
    (TRACKTRANSLATECODEC, "TrackTranslateCodec"),
    (TRACKTRANSLATEEDITIONUID, "TrackTranslateEditionUID"),
    (SIMPLETAG, "SimpleTag"),
    (TARGETTYPEVALUE, "TargetTypeValue"),
    (CHAPPROCESSCOMMAND, "ChapProcessCommand"),
    (CHAPPROCESSTIME, "ChapProcessTime"),
    (CHAPTERTRANSLATE, "ChapterTranslate"),
    (CHAPPROCESSDATA, "ChapProcessData"),
    (CHAPPROCESS, "ChapProcess"),
    (CHAPPROCESSCODECID, "ChapProcessCodecID"),
    (CHAPTERTRANSLATEID, "ChapterTranslateID"),
    (CHAPTERTRANSLATECODEC, "ChapterTranslateCodec"),
    (CHAPTERTRANSLATEEDITIONUID, "ChapterTranslateEditionUID"),
    (CONTENTENCODINGS, "ContentEncodings"),
    (MINCACHE, "MinCache"),
    (MAXCACHE, "MaxCache"),
    (CHAPTERSEGMENTUID, "ChapterSegmentUID"),
    (CHAPTERSEGMENTEDITIONUID, "ChapterSegmentEditionUID"),
    (TRACKOVERLAY, "TrackOverlay"),
    (TAG, "Tag"),
    (SEGMENTFILENAME, "SegmentFilename"),
    (SEGMENTUID, "SegmentUID"),
    (CHAPTERUID, "ChapterUID"),
    (TRACKUID, "TrackUID"),
    (ATTACHMENTLINK, "AttachmentLink"),
    (CHANNELPOSITIONS, "ChannelPositions"),
    (CLUSTERBLOCKADDITIONS, "ClusterBlockAdditions"),
    (OUTPUTSAMPLINGFREQUENCY, "OutputSamplingFrequency"),
    (TITLE, "Title"),
    (LANGUAGE, "Language"),
    (TRACKTIMECODESCALE, "TrackTimecodeScale"),
    (DEFAULTDURATION, "DefaultDuration"),
    (CODECNAME, "CodecName"),
    (CODECDOWNLOADURL, "CodecDownloadURL"),
    (TIMECODESCALE, "TimecodeScale"),
    (COLOURSPACE, "ColourSpace"),
    (GAMMAVALUE, "GammaValue"),
    (CODECSETTINGS, "CodecSettings"),
    (CODECINFOURL, "CodecInfoURL"),
    (PREVFILENAME, "PrevFilename"),
    (PREVUID, "PrevUID"),
    (NEXTFILENAME, "NextFilename"),
    (NEXTUID, "NextUID"),
    (CHAPTERS, "Chapters"),
    (SEEKHEAD, "SeekHead"),
    (TAGS, "Tags"),
    (INFO, "Info"),
    (TRACKS, "Tracks"),
    (SEGMENT, "Segment"),
    (ATTACHMENTS, "Attachments"),
    (EBML, "EBML"),
    (CUES, "Cues"),
    (CLUSTER, "Cluster"),
];

/// Name of a known element.
pub fn known_name(id: u32) -> Option<&'static str> {
    NAMES
        .binary_search_by_key(&id, |&(k, _)| k)
        .ok()
        .map(|i| NAMES[i].1)
}

/// Container elements. Their payload is a run of child elements.
static MASTERS: &[u32] = &[
    EBML,
    SEGMENT,
    SEEKHEAD,
    SEEK,
    INFO,
    CHAPTERTRANSLATE,
    CLUSTER,
    CLUSTERSILENTTRACKS,
    CLUSTERBLOCKGROUP,
    CLUSTERBLOCKADDITIONS,
    CLUSTERBLOCKMORE,
    CLUSTERSLICES,
    CLUSTERTIMESLICE,
    TRACKS,
    TRACKENTRY,
    TRACKTRANSLATE,
    VIDEO,
    AUDIO,
    CONTENTENCODINGS,
    CONTENTENCODING,
    CONTENTCOMPRESSION,
    CONTENTENCRYPTION,
    CUES,
    CUEPOINT,
    CUETRACKPOSITIONS,
    CUEREFERENCE,
    ATTACHMENTS,
    ATTACHEDFILE,
    CHAPTERS,
    EDITIONENTRY,
    CHAPTERATOM,
    CHAPTERTRACK,
    CHAPTERDISPLAY,
    CHAPPROCESS,
    CHAPPROCESSCOMMAND,
    TAGS,
    TAG,
    TARGETS,
    SIMPLETAG,
];

pub fn is_master(id: u32) -> bool {
    MASTERS.contains(&id)
}

/// Element name, or the ID in hex when it is not known.
pub fn id_name(id: u32) -> Cow<'static, str> {
    match known_name(id) {
        Some(name) => Cow::Borrowed(name),
        None => Cow::Owned(format!("{id:x}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_sorted_and_unique() {
        assert!(NAMES.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn masters_are_named_containers() {
        assert!(MASTERS.iter().all(|&id| known_name(id).is_some()));
        assert!(is_master(CLUSTER) && is_master(SIMPLETAG) && is_master(CHAPTERDISPLAY));
        assert!(!is_master(CODECPRIVATE) && !is_master(FILEDATA) && !is_master(CLUSTERSIMPLEBLOCK));
    }

    #[test]
    fn lookups() {
        assert_eq!(id_name(EBML), "EBML");
        assert_eq!(id_name(CLUSTERSIMPLEBLOCK), "ClusterSimpleBlock");
        assert_eq!(known_name(0x7FFF_FFFF), None);
        assert_eq!(id_name(0x1234), "1234");
    }
}
